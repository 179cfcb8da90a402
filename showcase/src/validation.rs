//! Caller-side validation.
//!
//! Reducers trust their input. Everything a user can get wrong is checked
//! here, before an action is built, and reported as a [`ValidationError`].

use crate::money::{Money, Rate};
use thiserror::Error;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Why a request was rejected before dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Item name is blank
    #[error("Name cannot be empty")]
    EmptyName,

    /// Post title is blank
    #[error("Title cannot be empty")]
    EmptyTitle,

    /// Price is zero or negative
    #[error("Price must be greater than zero")]
    NonPositivePrice,

    /// Discount is 100% or more
    #[error("Discount must be below 100%")]
    DiscountOutOfRange,

    /// A required form field is blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email address is malformed
    #[error("Email address is not valid")]
    InvalidEmail,

    /// Password shorter than the minimum
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum length
        min: usize,
    },

    /// Password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Terms of service not accepted
    #[error("You must accept the terms")]
    TermsNotAccepted,
}

/// Trims `name`, rejecting blank names
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] if nothing remains after trimming.
pub fn require_name(name: &str) -> Result<String, ValidationError> {
    non_blank(name).ok_or(ValidationError::EmptyName)
}

/// Trims `title`, rejecting blank titles
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] if nothing remains after trimming.
pub fn require_title(title: &str) -> Result<String, ValidationError> {
    non_blank(title).ok_or(ValidationError::EmptyTitle)
}

/// # Errors
///
/// Returns [`ValidationError::NonPositivePrice`] for zero or negative amounts.
pub const fn require_positive(price: Money) -> Result<Money, ValidationError> {
    if price.is_positive() {
        Ok(price)
    } else {
        Err(ValidationError::NonPositivePrice)
    }
}

/// # Errors
///
/// Returns [`ValidationError::DiscountOutOfRange`] for rates of 100% or more.
pub const fn require_discount(rate: Rate) -> Result<Rate, ValidationError> {
    if rate.is_valid_discount() {
        Ok(rate)
    } else {
        Err(ValidationError::DiscountOutOfRange)
    }
}

/// Loose structural email check: `local@domain.tld`, no whitespace
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Trimmed text, or `None` if blank
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(require_name("  Widget "), Ok("Widget".to_string()));
        assert_eq!(require_name("   "), Err(ValidationError::EmptyName));
        assert_eq!(require_title(""), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn prices_must_be_positive() {
        assert!(require_positive(Money::from_cents(1)).is_ok());
        assert_eq!(
            require_positive(Money::ZERO),
            Err(ValidationError::NonPositivePrice)
        );
        assert_eq!(
            require_positive(Money::from_cents(-100)),
            Err(ValidationError::NonPositivePrice)
        );
    }

    #[test]
    fn discounts_stay_below_one() {
        assert!(require_discount(Rate::ZERO).is_ok());
        assert_eq!(
            require_discount(Rate::ONE),
            Err(ValidationError::DiscountOutOfRange)
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email(" ada@mail.example.org "));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("a da@example.com"));
        assert!(!is_valid_email("ada@.com"));
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ValidationError::MissingField("Email").to_string(),
            "Email is required"
        );
        assert_eq!(
            ValidationError::PasswordTooShort { min: 8 }.to_string(),
            "Password must be at least 8 characters"
        );
    }
}
