use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::{Lesson, LessonId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod api;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod search;
pub mod state;
pub mod validation;

pub use api::{HttpLessonsApi, LessonsApi};
pub use checkout::CheckoutOutcome;
pub use error::{ShopError, ShopResult};
pub use search::{SearchDebouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use state::{CheckoutPhase, ShopState, SortDirection, SortKey};

#[derive(Debug, Clone)]
pub enum ShopEvent {
    LessonsUpdated {
        count: usize,
        query: Option<String>,
    },
    CartChanged {
        count: usize,
    },
    CheckoutFinished(CheckoutOutcome),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ShopOptions {
    pub search_debounce: Duration,
    pub payment_required: bool,
}

impl Default for ShopOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            payment_required: false,
        }
    }
}

/// Owns the shop state and sequences every change to it.
///
/// Views read via [`ShopController::snapshot`] and react to [`ShopEvent`]s;
/// they never hold on to the state itself.
pub struct ShopController {
    api: Arc<dyn LessonsApi>,
    state: Mutex<ShopState>,
    refresh_generation: AtomicU64,
    /// Set while a checkout is in flight; guards re-entrancy and cart edits.
    submitting: AtomicBool,
    search: SearchDebouncer,
    events: broadcast::Sender<ShopEvent>,
}

/// Clears the in-flight flag when a checkout ends, including when its future
/// is dropped before the backend answers.
struct SubmissionGuard<'a> {
    submitting: &'a AtomicBool,
    state: &'a Mutex<ShopState>,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            if state.checkout_phase.is_submitting() {
                warn!("checkout abandoned before the backend answered");
                state.checkout_phase = CheckoutPhase::Idle;
            }
        }
        self.submitting.store(false, Ordering::SeqCst);
    }
}

impl ShopController {
    pub fn new(api: Arc<dyn LessonsApi>, options: ShopOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            state: Mutex::new(ShopState::new(options.payment_required)),
            refresh_generation: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
            search: SearchDebouncer::new(options.search_debounce),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ShopEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ShopState {
        self.state.lock().await.clone()
    }

    fn emit(&self, event: ShopEvent) {
        let _ = self.events.send(event);
    }

    fn begin_refresh(&self) -> u64 {
        self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replaces the lesson list with the full catalogue. Failures are logged
    /// and reported as events only.
    pub async fn fetch_lessons(&self) {
        let generation = self.begin_refresh();
        match self.api.list_lessons().await {
            Ok(lessons) => self.apply_lessons(generation, lessons, None).await,
            Err(err) => {
                error!(error = %err, "fetch lessons failed");
                self.emit(ShopEvent::Error(err.to_string()));
            }
        }
    }

    /// Replaces the lesson list with the results for `query`. A blank query
    /// loads the full catalogue instead.
    pub async fn fetch_search_results(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.fetch_lessons().await;
            return;
        }

        let generation = self.begin_refresh();
        match self.api.search_lessons(query).await {
            Ok(lessons) => {
                self.apply_lessons(generation, lessons, Some(query.to_string()))
                    .await
            }
            Err(err) => {
                error!(error = %err, query, "search failed");
                self.emit(ShopEvent::Error(err.to_string()));
            }
        }
    }

    /// Debounced entry point for search-box input: only the last text typed
    /// within the debounce window is searched for.
    pub fn on_search_input(self: &Arc<Self>, text: &str) {
        let controller = Arc::downgrade(self);
        let text = text.to_string();
        self.search.schedule(async move {
            if let Some(controller) = controller.upgrade() {
                controller.fetch_search_results(&text).await;
            }
        });
    }

    pub fn cancel_pending_search(&self) {
        self.search.cancel();
    }

    async fn apply_lessons(&self, generation: u64, lessons: Vec<Lesson>, query: Option<String>) {
        let mut guard = self.state.lock().await;
        let latest = self.refresh_generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(generation, latest, "dropping stale lesson response");
            return;
        }
        let count = lessons.len();
        guard.replace_lessons(lessons);
        drop(guard);

        info!(count, query = query.as_deref().unwrap_or(""), "lesson list replaced");
        self.emit(ShopEvent::LessonsUpdated { count, query });
    }

    /// Returns whether a unit was added. Full or unknown lessons are ignored.
    pub async fn add_to_cart(&self, lesson_id: &LessonId) -> bool {
        let mut guard = self.state.lock().await;
        if self.submitting.load(Ordering::SeqCst) {
            debug!(lesson_id = %lesson_id, "cart is locked while an order is submitting");
            return false;
        }
        let next = cart::add_to_cart(&guard, lesson_id);
        let added = next.cart.len() > guard.cart.len();
        *guard = next;
        let count = guard.cart.len();
        drop(guard);

        if added {
            self.emit(ShopEvent::CartChanged { count });
        }
        added
    }

    pub async fn remove_from_cart(&self, index: usize) -> ShopResult<bool> {
        let mut guard = self.state.lock().await;
        if self.submitting.load(Ordering::SeqCst) {
            debug!(index, "cart is locked while an order is submitting");
            return Ok(false);
        }
        *guard = cart::remove_from_cart(&guard, index)?;
        let count = guard.cart.len();
        drop(guard);

        self.emit(ShopEvent::CartChanged { count });
        Ok(true)
    }

    pub async fn set_customer_name(&self, name: &str) {
        self.state.lock().await.customer.name = name.to_string();
    }

    pub async fn set_customer_phone(&self, phone: &str) {
        self.state.lock().await.customer.phone = phone.to_string();
    }

    pub async fn set_card_number(&self, card_number: &str) {
        self.state.lock().await.payment.card_number = card_number.to_string();
    }

    pub async fn set_card_expiry(&self, expiry: &str) {
        self.state.lock().await.payment.expiry = expiry.to_string();
    }

    pub async fn set_card_cvc(&self, cvc: &str) {
        self.state.lock().await.payment.cvc = cvc.to_string();
    }

    pub async fn set_sort(&self, key: SortKey, direction: SortDirection) {
        self.state.lock().await.set_sort(key, direction);
    }

    pub async fn toggle_cart(&self) -> bool {
        let mut guard = self.state.lock().await;
        guard.toggle_cart();
        guard.show_cart
    }

    /// Places the current cart as an order.
    ///
    /// A call made while another checkout is in flight returns
    /// [`CheckoutOutcome::AlreadySubmitting`] without touching the network.
    /// Dropping the returned future mid-flight releases the cart again.
    /// On failure the cart, the form and the reduced capacities are kept so
    /// the user can retry or give seats back by removing items.
    pub async fn checkout(&self) -> CheckoutOutcome {
        let (order, updates, submission) = {
            let mut guard = self.state.lock().await;
            if self.submitting.load(Ordering::SeqCst) {
                debug!("checkout already in flight");
                return CheckoutOutcome::AlreadySubmitting;
            }
            if !guard.can_checkout() {
                debug!(
                    cart = guard.cart.len(),
                    valid_name = guard.valid_name(),
                    valid_phone = guard.valid_phone(),
                    valid_payment = guard.valid_payment(),
                    "checkout blocked"
                );
                guard.checkout_phase = CheckoutPhase::Idle;
                return CheckoutOutcome::Blocked;
            }
            self.submitting.store(true, Ordering::SeqCst);
            guard.checkout_phase = CheckoutPhase::Submitting;
            (
                checkout::build_order(&guard),
                checkout::space_updates(&guard),
                SubmissionGuard {
                    submitting: &self.submitting,
                    state: &self.state,
                },
            )
        };

        info!(items = order.items.len(), "submitting order");
        let result = checkout::submit(self.api.as_ref(), &order, &updates).await;

        let outcome = {
            let mut guard = self.state.lock().await;
            match result {
                Ok(()) => {
                    guard.clear_after_order();
                    guard.confirmation = checkout::ORDER_PLACED_MESSAGE.to_string();
                    guard.checkout_phase = CheckoutPhase::Succeeded;
                    CheckoutOutcome::Placed
                }
                Err(err) => {
                    if err.is_remote() {
                        warn!(error = %err, "checkout failed");
                    } else {
                        error!(error = %err, "checkout failed");
                    }
                    let message = checkout::failure_message(&err.user_reason());
                    guard.confirmation = message.clone();
                    guard.checkout_phase = CheckoutPhase::Failed;
                    CheckoutOutcome::Failed(message)
                }
            }
        };
        drop(submission);

        self.emit(ShopEvent::CheckoutFinished(outcome.clone()));
        outcome
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
