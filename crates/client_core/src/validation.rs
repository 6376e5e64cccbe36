//! Field validators for the checkout form. All pure, all cheap enough to run
//! on every keystroke.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use shared::domain::{Customer, PaymentDetails};

const CARD_DIGITS: usize = 16;

fn name_re() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z\s]+$").expect("name pattern compiles"))
}

fn digits_re() -> &'static Regex {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("digits pattern compiles"))
}

fn expiry_re() -> &'static Regex {
    static EXPIRY_RE: OnceLock<Regex> = OnceLock::new();
    EXPIRY_RE.get_or_init(|| {
        Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("expiry pattern compiles")
    })
}

/// Letters and whitespace only.
pub fn valid_name(name: &str) -> bool {
    name_re().is_match(name)
}

/// ASCII digits only.
pub fn valid_phone(phone: &str) -> bool {
    digits_re().is_match(phone)
}

pub fn customer_is_valid(customer: &Customer) -> bool {
    valid_name(&customer.name) && valid_phone(&customer.phone)
}

/// Sixteen digits; single spaces between groups are tolerated.
pub fn valid_card_number(card_number: &str) -> bool {
    let compact: String = card_number.split(' ').collect();
    compact.len() == CARD_DIGITS
        && digits_re().is_match(&compact)
        && !card_number.starts_with(' ')
        && !card_number.ends_with(' ')
        && !card_number.contains("  ")
}

pub fn valid_cvc(cvc: &str) -> bool {
    matches!(cvc.len(), 3 | 4) && digits_re().is_match(cvc)
}

/// `MM/YY`, not earlier than the current month.
pub fn valid_expiry(expiry: &str) -> bool {
    valid_expiry_at(expiry, Utc::now().date_naive())
}

pub fn valid_expiry_at(expiry: &str, today: NaiveDate) -> bool {
    let Some(caps) = expiry_re().captures(expiry.trim()) else {
        return false;
    };
    let (Ok(month), Ok(year)) = (caps[1].parse::<u32>(), caps[2].parse::<i32>()) else {
        return false;
    };
    let year = 2000 + year;
    (year, month) >= (today.year(), today.month())
}

pub fn payment_is_valid(payment: &PaymentDetails) -> bool {
    valid_card_number(&payment.card_number)
        && valid_expiry(&payment.expiry)
        && valid_cvc(&payment.cvc)
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
