//! Field validation for funnel input

use chrono::{DateTime, Datelike, Utc};

pub const INVALID_EMAIL: &str = "Please enter a valid email";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const NAME_NOT_LETTERS: &str = "Name must contain only letters";
pub const CARD_NOT_DIGITS: &str = "Card number must contain only digits";
pub const CARD_WRONG_LENGTH: &str = "Card number must be 16 digits";
pub const EXPIRY_FORMAT: &str = "Invalid format. Use MM/YY";
pub const CARD_EXPIRED: &str = "Card has expired";
pub const CVV_NOT_DIGITS: &str = "CVV must contain only digits";
pub const CVV_WRONG_LENGTH: &str = "CVV must be 3-4 digits";

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot in the
/// domain with at least one character on each side of it.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.chars().any(char::is_whitespace) {
        return Err(INVALID_EMAIL);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(INVALID_EMAIL);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(INVALID_EMAIL);
    }
    let inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if inner_dot {
        Ok(())
    } else {
        Err(INVALID_EMAIL)
    }
}

/// Names are two or more ASCII letters
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.chars().count() < 2 {
        return Err(NAME_TOO_SHORT);
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(NAME_NOT_LETTERS);
    }
    Ok(())
}

/// Card number with spaces and dashes removed
pub fn normalize_card_number(card_number: &str) -> String {
    card_number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Exactly 16 digits once separators are removed
pub fn validate_card_number(card_number: &str) -> Result<(), &'static str> {
    let digits = normalize_card_number(card_number);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CARD_NOT_DIGITS);
    }
    if digits.len() != 16 {
        return Err(CARD_WRONG_LENGTH);
    }
    Ok(())
}

/// `MM/YY`, not before the month of `now`
pub fn validate_expiry_date(expiry: &str, now: DateTime<Utc>) -> Result<(), &'static str> {
    let Some((month, year)) = expiry.trim().split_once('/') else {
        return Err(EXPIRY_FORMAT);
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(EXPIRY_FORMAT);
    }
    let (Ok(month @ 1..=12), Ok(year)) = (month.parse::<u32>(), year.parse::<i32>()) else {
        return Err(EXPIRY_FORMAT);
    };

    let current = (now.year().rem_euclid(100), now.month());
    if (year, month) < current {
        return Err(CARD_EXPIRED);
    }
    Ok(())
}

pub fn validate_cvv(cvv: &str) -> Result<(), &'static str> {
    if !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(CVV_NOT_DIGITS);
    }
    if !(3..=4).contains(&cvv.len()) {
        return Err(CVV_WRONG_LENGTH);
    }
    Ok(())
}

/// Two or more characters, letters and spaces only
pub fn validate_name_on_card(name_on_card: &str) -> Result<(), &'static str> {
    let name = name_on_card.trim();
    if name.chars().count() < 2 {
        return Err(NAME_TOO_SHORT);
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        return Err(NAME_NOT_LETTERS);
    }
    Ok(())
}
