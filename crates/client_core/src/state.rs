//! The shop's view state and the values derived from it.
//!
//! State is a plain struct. Everything a view needs beyond the raw fields is a
//! method recomputed on demand; nothing is cached.

use std::{cmp::Ordering, fmt, str::FromStr};

use shared::domain::{Customer, Lesson, LessonId, PaymentDetails};

use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Topic,
    Location,
    Price,
    Space,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [Self::Topic, Self::Location, Self::Price, Self::Space];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Location => "location",
            Self::Price => "price",
            Self::Space => "space",
        }
    }

    fn compare(self, a: &Lesson, b: &Lesson) -> Ordering {
        match self {
            Self::Topic => a.topic.cmp(&b.topic),
            Self::Location => a.location.cmp(&b.location),
            Self::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            Self::Space => a.space.cmp(&b.space),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort key '{s}'"))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Where the checkout state machine currently is.
///
/// `Succeeded` and `Failed` are resting states: they only record how the last
/// attempt ended and accept a new checkout just like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl CheckoutPhase {
    pub fn is_submitting(self) -> bool {
        self == Self::Submitting
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShopState {
    pub lessons: Vec<Lesson>,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub show_cart: bool,
    /// Lesson snapshots taken when each unit was added. Duplicates are
    /// separate units.
    pub cart: Vec<Lesson>,
    pub customer: Customer,
    pub payment: PaymentDetails,
    pub payment_required: bool,
    pub confirmation: String,
    pub checkout_phase: CheckoutPhase,
}

impl ShopState {
    pub fn new(payment_required: bool) -> Self {
        Self {
            payment_required,
            ..Self::default()
        }
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }

    pub(crate) fn lesson_mut(&mut self, id: &LessonId) -> Option<&mut Lesson> {
        self.lessons.iter_mut().find(|lesson| &lesson.id == id)
    }

    /// Units of `id` currently in the cart.
    pub fn held(&self, id: &LessonId) -> u32 {
        self.cart.iter().filter(|lesson| &lesson.id == id).count() as u32
    }

    /// Installs a freshly fetched lesson list. Seats held by the cart are taken
    /// off the server's counts so the store keeps matching the cart.
    pub fn replace_lessons(&mut self, mut lessons: Vec<Lesson>) {
        for lesson in &mut lessons {
            lesson.space = lesson.space.saturating_sub(self.held(&lesson.id));
        }
        self.lessons = lessons;
    }

    /// The lesson list ordered by the current sort settings. Ties keep store
    /// order.
    pub fn sorted_lessons(&self) -> Vec<&Lesson> {
        let mut sorted: Vec<&Lesson> = self.lessons.iter().collect();
        let key = self.sort_key;
        match self.sort_direction {
            SortDirection::Ascending => sorted.sort_by(|a, b| key.compare(a, b)),
            SortDirection::Descending => sorted.sort_by(|a, b| key.compare(b, a)),
        }
        sorted
    }

    pub fn cart_count(&self) -> usize {
        self.cart.len()
    }

    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(|lesson| lesson.price).sum()
    }

    /// Whether the store copy of `id` still has room.
    pub fn can_add(&self, id: &LessonId) -> bool {
        self.lesson(id).is_some_and(Lesson::is_available)
    }

    pub fn valid_name(&self) -> bool {
        validation::valid_name(&self.customer.name)
    }

    pub fn valid_phone(&self) -> bool {
        validation::valid_phone(&self.customer.phone)
    }

    pub fn valid_payment(&self) -> bool {
        !self.payment_required || validation::payment_is_valid(&self.payment)
    }

    pub fn can_checkout(&self) -> bool {
        !self.cart.is_empty() && self.valid_name() && self.valid_phone() && self.valid_payment()
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort_key = key;
        self.sort_direction = direction;
    }

    /// Flips between the lesson list and the cart. The cart cannot be opened
    /// while it is empty.
    pub fn toggle_cart(&mut self) {
        self.show_cart = !self.show_cart && !self.cart.is_empty();
    }

    pub(crate) fn clear_after_order(&mut self) {
        self.cart.clear();
        self.show_cart = false;
        self.customer = Customer::default();
        self.payment = PaymentDetails::default();
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
