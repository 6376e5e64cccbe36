//! Cart reducer. Cart contents and the store's `space` counters move in
//! lockstep: every unit in the cart is one seat taken from its lesson.

use shared::domain::LessonId;
use tracing::debug;

use crate::{
    error::{ShopError, ShopResult},
    state::ShopState,
};

/// Adds one unit of `lesson_id`, taking a seat from the store copy.
///
/// Capacity is checked against the lesson in the store, never against a cart
/// snapshot. An unknown or full lesson leaves the state unchanged.
pub fn add_to_cart(state: &ShopState, lesson_id: &LessonId) -> ShopState {
    let mut next = state.clone();
    let Some(lesson) = next.lesson_mut(lesson_id) else {
        debug!(lesson_id = %lesson_id, "add ignored: lesson not in list");
        return next;
    };
    if lesson.space == 0 {
        debug!(lesson_id = %lesson_id, "add ignored: lesson is full");
        return next;
    }

    let snapshot = lesson.clone();
    lesson.space -= 1;
    next.cart.push(snapshot);
    next
}

/// Removes the cart entry at `index` and gives its seat back to the store
/// copy, if the lesson is still listed.
pub fn remove_from_cart(state: &ShopState, index: usize) -> ShopResult<ShopState> {
    if index >= state.cart.len() {
        return Err(ShopError::CartIndexOutOfRange {
            index,
            len: state.cart.len(),
        });
    }

    let mut next = state.clone();
    let removed = next.cart.remove(index);
    if let Some(lesson) = next.lesson_mut(&removed.id) {
        lesson.space += 1;
    }
    if next.cart.is_empty() {
        next.show_cart = false;
    }
    Ok(next)
}

#[cfg(test)]
#[path = "tests/cart_tests.rs"]
mod tests;
