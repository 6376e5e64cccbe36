//! Checkout: turning the cart into an order and pushing the new capacities.

use futures::future::try_join_all;
use shared::{
    domain::LessonId,
    protocol::{Order, OrderItem},
};
use tracing::info;

use crate::{api::LessonsApi, error::ShopResult, state::ShopState};

pub const ORDER_PLACED_MESSAGE: &str = "Your order has been placed!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Empty cart or invalid form; nothing was sent.
    Blocked,
    /// Another checkout is in flight; nothing was sent.
    AlreadySubmitting,
    Placed,
    Failed(String),
}

pub fn failure_message(reason: &str) -> String {
    format!("Checkout failed: {reason}. Please refresh and try again.")
}

/// One `qty: 1` item per cart entry, in cart order.
pub fn build_order(state: &ShopState) -> Order {
    Order {
        name: state.customer.name.clone(),
        phone: state.customer.phone.clone(),
        items: state
            .cart
            .iter()
            .map(|lesson| OrderItem {
                lesson_id: lesson.id.clone(),
                qty: 1,
            })
            .collect(),
    }
}

/// The capacity to persist for each distinct lesson in the cart.
///
/// Values come from the store, whose counts have the cart's units taken off
/// (see [`ShopState::replace_lessons`]). Lessons no longer listed fall back to
/// the first snapshot minus the units held.
pub fn space_updates(state: &ShopState) -> Vec<(LessonId, u32)> {
    let mut updates: Vec<(LessonId, u32)> = Vec::new();
    for item in &state.cart {
        if updates.iter().any(|(id, _)| id == &item.id) {
            continue;
        }
        let space = match state.lesson(&item.id) {
            Some(lesson) => lesson.space,
            None => item.space.saturating_sub(state.held(&item.id)),
        };
        updates.push((item.id.clone(), space));
    }
    updates
}

/// Posts the order, then every capacity update concurrently. The first
/// failure fails the whole submission; updates already applied stay applied.
pub(crate) async fn submit(
    api: &dyn LessonsApi,
    order: &Order,
    updates: &[(LessonId, u32)],
) -> ShopResult<()> {
    api.create_order(order).await?;
    info!(items = order.items.len(), "order accepted");

    try_join_all(
        updates
            .iter()
            .map(|(lesson_id, space)| api.update_space(lesson_id, *space)),
    )
    .await?;
    info!(lessons = updates.len(), "lesson capacities updated");
    Ok(())
}

#[cfg(test)]
#[path = "tests/checkout_tests.rs"]
mod tests;
