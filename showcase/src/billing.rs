//! Billing: invoice lines with per-item discounts.
//!
//! Each item carries a two-state discount machine. Applying a discount to an
//! undiscounted item captures its price as `original_price`; applying another
//! re-bases off that captured price, so discounts never compound. Removing
//! the discount restores the captured price.

use crate::collection::{Collection, Entity, ItemId};
use crate::money::{Money, Rate, Totals};
use crate::validation::{require_discount, require_name, require_positive, ValidationError};
use cartwheel_core::effect::Effect;
use cartwheel_core::environment::{Clock, IdGenerator};
use cartwheel_core::reducer::Reducer;
use cartwheel_core::{smallvec, SmallVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An invoice line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingItem {
    /// Item id
    pub id: ItemId,
    /// Non-empty name
    pub name: String,
    /// Current price, discounted if a discount is active
    pub price: Money,
    /// Price before the active discount
    pub original_price: Option<Money>,
    /// Active discount
    pub discount: Option<Rate>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl BillingItem {
    /// Whether a discount is active
    #[must_use]
    pub const fn discount_status(&self) -> DiscountStatus {
        match self.original_price {
            Some(_) => DiscountStatus::Discounted,
            None => DiscountStatus::Undiscounted,
        }
    }

    fn apply_discount(&mut self, rate: Rate) {
        let original = *self.original_price.get_or_insert(self.price);
        self.price = original.discounted_by(rate);
        self.discount = Some(rate);
    }

    fn remove_discount(&mut self) -> bool {
        let Some(original) = self.original_price.take() else {
            return false;
        };
        self.price = original;
        self.discount = None;
        true
    }
}

impl Entity for BillingItem {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// Discount state of a [`BillingItem`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountStatus {
    /// Full price; no `original_price`
    Undiscounted,
    /// Reduced price; `original_price` holds the full price
    Discounted,
}

/// An invoice line before it has an id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBillingItem {
    /// Item name
    pub name: String,
    /// Price, positive
    pub price: Money,
}

/// Editable fields of a [`BillingItem`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPatch {
    /// New name
    pub name: Option<String>,
    /// New full price; ends any active discount
    pub price: Option<Money>,
}

impl BillingPatch {
    fn apply_to(self, item: &mut BillingItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(price) = self.price {
            item.price = price;
            item.original_price = None;
            item.discount = None;
        }
    }
}

/// State of the billing feature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingState {
    /// Invoice lines in creation order
    pub items: Collection<BillingItem>,
}

impl BillingState {
    /// Creates an empty invoice
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Collection::new(),
        }
    }

    /// Sum of current prices
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Subtotal, tax and total at `tax_rate`
    #[must_use]
    pub fn totals(&self, tax_rate: Rate) -> Totals {
        Totals::from_subtotal(self.subtotal(), tax_rate)
    }

    /// Number of items with an active discount
    #[must_use]
    pub fn discounted_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.discount_status() == DiscountStatus::Discounted)
            .count()
    }
}

/// The discount one UI step above `current`
///
/// Starts at `step` for an undiscounted item. A step that would reach 100%
/// leaves the discount at `current`.
///
/// ```
/// use cartwheel::billing::next_discount;
/// use cartwheel::money::Rate;
///
/// let step = Rate::from_percent(10).unwrap_or(Rate::ZERO);
/// let ninety = Rate::from_percent(90).unwrap_or(Rate::ZERO);
/// assert_eq!(next_discount(None, step), step);
/// assert_eq!(next_discount(Some(ninety), step), ninety);
/// ```
#[must_use]
pub fn next_discount(current: Option<Rate>, step: Rate) -> Rate {
    let current = current.unwrap_or(Rate::ZERO);
    current
        .checked_add(step)
        .filter(Rate::is_valid_discount)
        .unwrap_or(current)
}

/// Actions for the billing feature
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BillingAction {
    /// Append an invoice line
    Add {
        /// Id for the new line
        id: ItemId,
        /// Line contents
        item: NewBillingItem,
        /// Creation time
        at: DateTime<Utc>,
    },
    /// Edit a line in place
    Update {
        /// Target line
        id: ItemId,
        /// Fields to change
        patch: BillingPatch,
    },
    /// Delete a line
    Remove {
        /// Target line
        id: ItemId,
    },
    /// Price a line at `rate` off its undiscounted price
    ApplyDiscount {
        /// Target line
        id: ItemId,
        /// Discount, below 100%
        rate: Rate,
    },
    /// Restore a line's undiscounted price
    RemoveDiscount {
        /// Target line
        id: ItemId,
    },
    /// Delete every line
    Clear,
    /// Replace every line
    Replace {
        /// New contents, taken as-is
        items: Vec<BillingItem>,
    },
}

impl BillingAction {
    /// Validates and builds the `Add` action
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`] for a blank name
    /// - [`ValidationError::NonPositivePrice`] for a zero or negative price
    pub fn add(
        name: &str,
        price: Money,
        ids: &impl IdGenerator,
        clock: &impl Clock,
    ) -> Result<Self, ValidationError> {
        let name = require_name(name)?;
        let price = require_positive(price)?;

        Ok(Self::Add {
            id: ItemId::new(ids.next_id()),
            item: NewBillingItem { name, price },
            at: clock.now(),
        })
    }

    /// Validates and builds the `ApplyDiscount` action
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DiscountOutOfRange`] for 100% or more.
    pub fn apply_discount(id: ItemId, rate: Rate) -> Result<Self, ValidationError> {
        Ok(Self::ApplyDiscount {
            id,
            rate: require_discount(rate)?,
        })
    }

    /// Validates and builds the `Update` action
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`] if the patch blanks the name
    /// - [`ValidationError::NonPositivePrice`] if the patch sets a non-positive price
    pub fn update(id: ItemId, mut patch: BillingPatch) -> Result<Self, ValidationError> {
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(require_name(name)?);
        }
        if let Some(price) = patch.price {
            require_positive(price)?;
        }
        Ok(Self::Update { id, patch })
    }
}

/// Reducer for the billing feature
#[derive(Clone, Copy, Debug, Default)]
pub struct BillingReducer;

impl BillingReducer {
    /// Creates a new billing reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for BillingReducer {
    type State = BillingState;
    type Action = BillingAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BillingAction::Add { id, item, at } => {
                let item = BillingItem {
                    id,
                    name: item.name,
                    price: item.price,
                    original_price: None,
                    discount: None,
                    created_at: at,
                };
                if !state.items.push(item) {
                    tracing::warn!(%id, "Ignoring billing item with duplicate id");
                }
            },
            BillingAction::Update { id, patch } => {
                if !state.items.update(id, |item| patch.apply_to(item)) {
                    tracing::trace!(%id, "Update for unknown billing item");
                }
            },
            BillingAction::Remove { id } => {
                if state.items.remove(id).is_none() {
                    tracing::trace!(%id, "Remove for unknown billing item");
                }
            },
            BillingAction::ApplyDiscount { id, rate } => {
                if !state.items.update(id, |item| item.apply_discount(rate)) {
                    tracing::trace!(%id, "Discount for unknown billing item");
                }
            },
            BillingAction::RemoveDiscount { id } => {
                let mut restored = false;
                state.items.update(id, |item| restored = item.remove_discount());
                if !restored {
                    tracing::trace!(%id, "No discount to remove");
                }
            },
            BillingAction::Clear => state.items.clear(),
            BillingAction::Replace { items } => state.items.replace(items),
        }

        smallvec![Effect::None]
    }
}
