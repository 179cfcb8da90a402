//! Money amounts, percentage rates, and the totals derived from them.
//!
//! Amounts are whole cents and rates are basis points, so every price a
//! reducer computes is exact and reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use thiserror::Error;

/// Money amount in cents (to avoid floating point issues)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents
    pub const ZERO: Self = Self(0);

    /// Creates a new money amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new money amount from dollars (converted to cents)
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the value in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in dollars (as floating point)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // i64 to f64 precision loss is acceptable for display
    pub fn dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns `true` for amounts above zero
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// This amount multiplied by `rate`, rounded half away from zero to the cent
    #[must_use]
    pub fn times(self, rate: Rate) -> Self {
        let scaled = i128::from(self.0) * i128::from(rate.basis_points());
        let half = i128::from(Rate::SCALE / 2);
        let rounded = if scaled >= 0 {
            (scaled + half) / i128::from(Rate::SCALE)
        } else {
            (scaled - half) / i128::from(Rate::SCALE)
        };
        Self(i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN }))
    }

    /// This amount with a `discount` taken off
    ///
    /// ```
    /// use cartwheel::money::{Money, Rate};
    ///
    /// let price = Money::from_dollars(100);
    /// let rate = Rate::from_percent(10).unwrap_or(Rate::ZERO);
    /// assert_eq!(price.discounted_by(rate), Money::from_dollars(90));
    /// ```
    #[must_use]
    pub fn discounted_by(self, discount: Rate) -> Self {
        self.times(discount.complement())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, qty: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(qty)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Errors building a [`Rate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    /// The value is NaN or infinite
    #[error("rate must be a finite number")]
    NotFinite,

    /// The value lies outside `[0, 1]`
    #[error("rate {0} is outside the range 0..=1")]
    OutOfRange(f64),
}

/// A fraction in `[0, 1]`, stored in basis points
///
/// Serialized as a plain fraction (`0.08` for 8%).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(u32);

impl Rate {
    /// Basis points in a whole
    pub const SCALE: u32 = 10_000;

    /// 0%
    pub const ZERO: Self = Self(0);

    /// 100%
    pub const ONE: Self = Self(Self::SCALE);

    /// Creates a rate from basis points, clamped to 100%
    #[must_use]
    pub const fn saturating_from_basis_points(basis_points: u32) -> Self {
        if basis_points > Self::SCALE {
            Self::ONE
        } else {
            Self(basis_points)
        }
    }

    /// Creates a rate from basis points (1/100 of a percent)
    ///
    /// # Errors
    ///
    /// Returns [`RateError::OutOfRange`] above 10 000 basis points.
    pub fn try_from_basis_points(basis_points: u32) -> Result<Self, RateError> {
        if basis_points > Self::SCALE {
            return Err(RateError::OutOfRange(
                f64::from(basis_points) / f64::from(Self::SCALE),
            ));
        }
        Ok(Self(basis_points))
    }

    /// Creates a rate from a whole percentage
    ///
    /// # Errors
    ///
    /// Returns [`RateError::OutOfRange`] above 100.
    pub fn from_percent(percent: u32) -> Result<Self, RateError> {
        Self::try_from_basis_points(percent.saturating_mul(100))
    }

    /// Creates a rate from a fraction, rounded to the nearest basis point
    ///
    /// # Errors
    ///
    /// - [`RateError::NotFinite`] for NaN or infinities
    /// - [`RateError::OutOfRange`] outside `[0, 1]`
    pub fn try_from_fraction(fraction: f64) -> Result<Self, RateError> {
        if !fraction.is_finite() {
            return Err(RateError::NotFinite);
        }
        if !(0.0..=1.0).contains(&fraction) {
            return Err(RateError::OutOfRange(fraction));
        }

        // In range, so the rounded value fits in u32
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let basis_points = (fraction * f64::from(Self::SCALE)).round() as u32;
        Ok(Self(basis_points))
    }

    /// Returns the rate in basis points
    #[must_use]
    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction
    #[must_use]
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / f64::from(Self::SCALE)
    }

    /// `1 - self`
    #[must_use]
    pub const fn complement(&self) -> Self {
        Self(Self::SCALE - self.0)
    }

    /// `self + other`, or `None` if that would exceed 100%
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        let sum = self.0 + other.0;
        if sum > Self::SCALE {
            None
        } else {
            Some(Self(sum))
        }
    }

    /// Returns `true` for rates usable as a discount (`< 100%`)
    #[must_use]
    pub const fn is_valid_discount(&self) -> bool {
        self.0 < Self::SCALE
    }
}

impl TryFrom<f64> for Rate {
    type Error = RateError;

    fn try_from(fraction: f64) -> Result<Self, Self::Error> {
        Self::try_from_fraction(fraction)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.as_fraction()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;
        if fraction == 0 {
            write!(f, "{whole}%")
        } else if fraction % 10 == 0 {
            write!(f, "{whole}.{}%", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02}%")
        }
    }
}

/// Subtotal, tax and grand total of a collection
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line amounts
    pub subtotal: Money,
    /// `subtotal * tax_rate`
    pub tax: Money,
    /// `subtotal + tax`
    pub total: Money,
}

impl Totals {
    /// Derives tax and total from a subtotal
    #[must_use]
    pub fn from_subtotal(subtotal: Money, tax_rate: Rate) -> Self {
        let tax = subtotal.times(tax_rate);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subtotal {} + tax {} = {}",
            self.subtotal, self.tax, self.total
        )
    }
}
