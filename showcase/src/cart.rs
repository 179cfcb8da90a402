//! Shopping cart: catalog products with quantities.
//!
//! Cart lines are keyed by product id. Adding a product that is already in
//! the cart bumps its quantity; a quantity that falls to zero or below
//! removes the line.

use crate::collection::{Collection, Entity, ItemId};
use crate::money::{Money, Rate, Totals};
use crate::validation::{require_name, require_positive, ValidationError};
use cartwheel_core::effect::Effect;
use cartwheel_core::environment::Clock;
use cartwheel_core::reducer::Reducer;
use cartwheel_core::{smallvec, SmallVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id, reused as the cart line id
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Money,
}

impl Product {
    /// Validates and creates a product
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`] for a blank name
    /// - [`ValidationError::NonPositivePrice`] for a zero or negative price
    pub fn new(id: ItemId, name: &str, price: Money) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: require_name(name)?,
            price: require_positive(price)?,
        })
    }

    /// The demo catalog
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        [
            (1, "Laptop", Money::from_dollars(1200)),
            (2, "Headphones", Money::from_cents(19_999)),
            (3, "Keyboard", Money::from_cents(8_950)),
            (4, "Mouse", Money::from_cents(2_499)),
        ]
        .into_iter()
        .map(|(id, name, price)| Self {
            id: ItemId::new(id),
            name: name.to_string(),
            price,
        })
        .collect()
    }
}

impl Entity for Product {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// A cart line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id
    pub id: ItemId,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Quantity, at least 1
    pub qty: u32,
    /// When the product first entered the cart
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// `price * qty`
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.qty
    }
}

impl Entity for CartItem {
    fn id(&self) -> ItemId {
        self.id
    }
}

/// State of the cart feature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Lines in the order products were first added
    pub items: Collection<CartItem>,
}

impl CartState {
    /// Creates an empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Collection::new(),
        }
    }

    /// Looks up a line by product id
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&CartItem> {
        self.items.get(id)
    }

    /// Sum of line totals
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Subtotal, tax and total at `tax_rate`
    #[must_use]
    pub fn totals(&self, tax_rate: Rate) -> Totals {
        Totals::from_subtotal(self.subtotal(), tax_rate)
    }

    /// Total quantity across lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}

/// Actions for the cart feature
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CartAction {
    /// Add one unit of a product
    AddOrIncrement {
        /// The product
        product: Product,
        /// Time of the request
        at: DateTime<Utc>,
    },
    /// Change a line's quantity by `delta`
    UpdateQty {
        /// Target line
        id: ItemId,
        /// Signed change
        delta: i64,
    },
    /// Delete a line
    Remove {
        /// Target line
        id: ItemId,
    },
    /// Empty the cart
    Clear,
    /// Replace every line
    Replace {
        /// New contents, taken as-is
        items: Vec<CartItem>,
    },
}

impl CartAction {
    /// Builds `AddOrIncrement` stamped with the current time
    #[must_use]
    pub fn add_or_increment(product: &Product, clock: &impl Clock) -> Self {
        Self::AddOrIncrement {
            product: product.clone(),
            at: clock.now(),
        }
    }
}

/// Reducer for the cart feature
#[derive(Clone, Copy, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new cart reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::AddOrIncrement { product, at } => {
                if let Some(line) = state.items.get_mut(product.id) {
                    line.qty = line.qty.saturating_add(1);
                } else {
                    state.items.push(CartItem {
                        id: product.id,
                        name: product.name,
                        price: product.price,
                        qty: 1,
                        added_at: at,
                    });
                }
            },
            CartAction::UpdateQty { id, delta } => {
                let Some(line) = state.items.get_mut(id) else {
                    tracing::trace!(%id, "Quantity change for unknown cart line");
                    return smallvec![Effect::None];
                };

                let qty = i64::from(line.qty).saturating_add(delta);
                if qty <= 0 {
                    tracing::debug!(%id, "Quantity exhausted, removing cart line");
                    state.items.remove(id);
                } else {
                    line.qty = u32::try_from(qty).unwrap_or(u32::MAX);
                }
            },
            CartAction::Remove { id } => {
                if state.items.remove(id).is_none() {
                    tracing::trace!(%id, "Remove for unknown cart line");
                }
            },
            CartAction::Clear => state.items.clear(),
            CartAction::Replace { items } => state.items.replace(items),
        }

        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_testing::{assertions, test_clock, ReducerTest};

    fn laptop() -> Product {
        Product {
            id: ItemId::new(1),
            name: "Laptop".to_string(),
            price: Money::from_dollars(1200),
        }
    }

    fn line(id: u64, qty: u32) -> CartItem {
        CartItem {
            id: ItemId::new(id),
            name: format!("Product {id}"),
            price: Money::from_dollars(10),
            qty,
            added_at: test_clock().now(),
        }
    }

    fn state_with(items: Vec<CartItem>) -> CartState {
        CartState {
            items: Collection::from_items(items),
        }
    }

    fn pct(p: u32) -> Rate {
        Rate::from_percent(p).unwrap_or_default()
    }

    #[test]
    fn laptop_twice() {
        let clock = test_clock();

        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(CartState::new())
            .when_action(CartAction::add_or_increment(&laptop(), &clock))
            .when_action(CartAction::add_or_increment(&laptop(), &clock))
            .then_state(|state| {
                assert_eq!(
                    state.items.as_slice(),
                    &[CartItem {
                        id: ItemId::new(1),
                        name: "Laptop".to_string(),
                        price: Money::from_dollars(1200),
                        qty: 2,
                        added_at: test_clock().now(),
                    }]
                );

                let totals = state.totals(pct(10));
                assert_eq!(totals.subtotal, Money::from_dollars(2400));
                assert_eq!(totals.tax, Money::from_dollars(240));
                assert_eq!(totals.total, Money::from_dollars(2640));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn distinct_products_get_separate_lines() {
        let catalog = Product::catalog();
        let clock = test_clock();

        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(CartState::new())
            .when_actions(catalog.iter().take(2).map(|p| CartAction::add_or_increment(p, &clock)))
            .then_state(|state| {
                assert_eq!(state.items.len(), 2);
                assert!(state.items.iter().all(|line| line.qty == 1));
                assert_eq!(state.item_count(), 2);
            })
            .run();
    }

    #[test]
    fn increment_matches_by_id_only() {
        let renamed = Product {
            name: "Different name".to_string(),
            price: Money::from_dollars(1),
            ..laptop()
        };

        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(CartState::new())
            .when_action(CartAction::add_or_increment(&laptop(), &test_clock()))
            .when_action(CartAction::add_or_increment(&renamed, &test_clock()))
            .then_state(|state| {
                let only = state.get(ItemId::new(1));
                assert_eq!(only.map(|l| l.qty), Some(2));
                assert_eq!(only.map(|l| l.name.as_str()), Some("Laptop"));
            })
            .run();
    }

    #[test]
    fn update_qty_adds_signed_delta() {
        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(state_with(vec![line(1, 3)]))
            .when_action(CartAction::UpdateQty {
                id: ItemId::new(1),
                delta: 4,
            })
            .when_action(CartAction::UpdateQty {
                id: ItemId::new(1),
                delta: -2,
            })
            .then_state(|state| assert_eq!(state.get(ItemId::new(1)).map(|l| l.qty), Some(5)))
            .run();
    }

    #[test]
    fn update_qty_to_zero_or_below_removes() {
        for delta in [-1, -2, -100] {
            ReducerTest::new(CartReducer::new())
                .with_env(())
                .given_state(state_with(vec![line(1, 1), line(2, 1)]))
                .when_action(CartAction::UpdateQty {
                    id: ItemId::new(1),
                    delta,
                })
                .then_state(|state| {
                    assert!(!state.items.contains(ItemId::new(1)));
                    assert!(state.items.contains(ItemId::new(2)));
                })
                .run();
        }
    }

    #[test]
    fn update_qty_unknown_id_is_noop() {
        let initial = state_with(vec![line(1, 2)]);
        let expected = initial.clone();

        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(initial)
            .when_action(CartAction::UpdateQty {
                id: ItemId::new(5),
                delta: -1,
            })
            .then_state(move |state| assert_eq!(state, &expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn remove_twice_equals_once() {
        let mut once = state_with(vec![line(1, 1), line(2, 1)]);
        let _ = CartReducer.reduce(&mut once, CartAction::Remove { id: ItemId::new(1) }, &());
        let mut twice = once.clone();
        let _ = CartReducer.reduce(&mut twice, CartAction::Remove { id: ItemId::new(1) }, &());
        assert_eq!(once, twice);
    }

    #[test]
    fn replace_then_clear() {
        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(CartState::new())
            .when_action(CartAction::Replace {
                items: vec![line(1, 2), line(2, 3)],
            })
            .then_state(|state| {
                assert_eq!(state.item_count(), 5);
                assert_eq!(state.subtotal(), Money::from_dollars(50));
            })
            .run();

        ReducerTest::new(CartReducer::new())
            .with_env(())
            .given_state(state_with(vec![line(1, 2)]))
            .when_action(CartAction::Clear)
            .then_state(|state| assert!(state.items.is_empty()))
            .run();
    }

    #[test]
    fn product_validation() {
        assert_eq!(
            Product::new(ItemId::new(9), "", Money::from_dollars(1)),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            Product::new(ItemId::new(9), "Cable", Money::from_cents(-1)),
            Err(ValidationError::NonPositivePrice)
        );
        assert!(Product::catalog().iter().all(|p| p.price.is_positive()));
    }
}
