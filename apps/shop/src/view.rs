//! Plain-text rendering of state snapshots. Nothing here mutates state.

use std::fmt::Write as _;

use client_core::{ShopEvent, ShopState};

fn price(value: f64) -> String {
    format!("£{value:.2}")
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "invalid"
    }
}

pub fn render(state: &ShopState) -> String {
    if state.show_cart {
        render_cart(state)
    } else {
        render_lessons(state)
    }
}

pub fn render_lessons(state: &ShopState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "lessons (by {} {}), cart: {}",
        state.sort_key,
        match state.sort_direction {
            client_core::SortDirection::Ascending => "asc",
            client_core::SortDirection::Descending => "desc",
        },
        state.cart_count()
    );
    if state.lessons.is_empty() {
        out.push_str("  no lessons\n");
        return out;
    }
    for lesson in state.sorted_lessons() {
        let availability = if lesson.is_available() {
            format!("{} left", lesson.space)
        } else {
            "full".to_string()
        };
        let _ = writeln!(
            out,
            "  [{}] {:<16} {:<14} {:>9}  {}",
            lesson.id,
            lesson.topic,
            lesson.location,
            price(lesson.price),
            availability
        );
    }
    out
}

pub fn render_cart(state: &ShopState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "cart ({} item(s))", state.cart_count());
    for (index, lesson) in state.cart.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {index}: {} at {} {}",
            lesson.topic,
            lesson.location,
            price(lesson.price)
        );
    }
    let _ = writeln!(out, "  total {}", price(state.cart_total()));
    let _ = writeln!(
        out,
        "  name '{}' [{}]  phone '{}' [{}]",
        state.customer.name,
        mark(state.valid_name()),
        state.customer.phone,
        mark(state.valid_phone())
    );
    if state.payment_required {
        let _ = writeln!(out, "  payment [{}]", mark(state.valid_payment()));
    }
    if !state.confirmation.is_empty() {
        let _ = writeln!(out, "  {}", state.confirmation);
    }
    out
}

/// A line for events that arrive outside the prompt's request/response
/// rhythm, such as debounced search results.
pub fn render_event(event: &ShopEvent) -> Option<String> {
    match event {
        ShopEvent::LessonsUpdated {
            count,
            query: Some(query),
        } => Some(format!("{count} lesson(s) match '{query}'")),
        ShopEvent::LessonsUpdated { count, query: None } => Some(format!("{count} lesson(s)")),
        ShopEvent::CheckoutFinished(_) | ShopEvent::CartChanged { .. } => None,
        ShopEvent::Error(message) => Some(format!("error: {message}")),
    }
}

/// Everything printed when an event arrives. A replaced lesson list is
/// printed in full so debounced search results show up without a `list`.
pub fn render_update(event: &ShopEvent, state: &ShopState) -> Option<String> {
    let line = render_event(event)?;
    match event {
        ShopEvent::LessonsUpdated { .. } => Some(format!("{line}\n{}", render_lessons(state))),
        _ => Some(line),
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
