//! Property tests for the collection reducers

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use cartwheel::billing::{BillingAction, BillingReducer, BillingState};
use cartwheel::blog::{BlogAction, BlogReducer, BlogState, NewPost};
use cartwheel::cart::{CartAction, CartItem, CartReducer, CartState};
use cartwheel::{Collection, ItemId, Money, Rate};
use cartwheel_core::environment::{Clock, SequentialIds};
use cartwheel_core::reducer::Reducer;
use cartwheel_testing::properties::{discount_basis_points, item_name, positive_cents, qty_delta};
use cartwheel_testing::test_clock;
use proptest::prelude::*;
use std::collections::HashSet;

fn rate(basis_points: u32) -> Rate {
    Rate::try_from_basis_points(basis_points).unwrap()
}

fn cart_line(id: u64, qty: u32) -> CartItem {
    CartItem {
        id: ItemId::new(id),
        name: format!("Product {id}"),
        price: Money::from_cents(999),
        qty,
        added_at: test_clock().now(),
    }
}

fn cart_state() -> impl Strategy<Value = CartState> {
    prop::collection::btree_map(1_u64..20, 1_u32..10, 0..8).prop_map(|lines| CartState {
        items: Collection::from_items(
            lines
                .into_iter()
                .map(|(id, qty)| cart_line(id, qty))
                .collect(),
        ),
    })
}

proptest! {
    #[test]
    fn adds_yield_unique_ids(items in prop::collection::vec((item_name(), positive_cents()), 0..30)) {
        let ids = SequentialIds::new();
        let clock = test_clock();
        let mut state = BillingState::new();

        for (name, cents) in &items {
            let action = BillingAction::add(name, Money::from_cents(*cents), &ids, &clock).unwrap();
            BillingReducer.reduce(&mut state, action, &());
        }

        let unique: HashSet<ItemId> = state.items.iter().map(|i| i.id).collect();
        prop_assert_eq!(state.items.len(), items.len());
        prop_assert_eq!(unique.len(), items.len());
    }

    #[test]
    fn blog_adds_yield_unique_ids(titles in prop::collection::vec(item_name(), 0..30)) {
        let ids = SequentialIds::new();
        let clock = test_clock();
        let reducer = BlogReducer::new();
        let mut state = BlogState::with_welcome_post(&ids, &clock);

        for title in &titles {
            let action = BlogAction::add(NewPost::new(title.as_str(), ""), &ids, &clock).unwrap();
            reducer.reduce(&mut state, action, &());
        }

        let unique: HashSet<ItemId> = state.posts.iter().map(|p| p.id).collect();
        prop_assert_eq!(unique.len(), titles.len() + 1);
    }

    #[test]
    fn remove_is_idempotent(state in cart_state(), id in 0_u64..25) {
        let mut once = state;
        CartReducer.reduce(&mut once, CartAction::Remove { id: ItemId::new(id) }, &());

        let mut twice = once.clone();
        CartReducer.reduce(&mut twice, CartAction::Remove { id: ItemId::new(id) }, &());

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn quantities_stay_positive(
        state in cart_state(),
        changes in prop::collection::vec((1_u64..20, qty_delta()), 0..40),
    ) {
        let mut state = state;
        let mut expected: std::collections::BTreeMap<u64, i64> = state
            .items
            .iter()
            .map(|line| (line.id.value(), i64::from(line.qty)))
            .collect();

        for (id, delta) in changes {
            CartReducer.reduce(&mut state, CartAction::UpdateQty { id: ItemId::new(id), delta }, &());

            if let Some(qty) = expected.get_mut(&id) {
                *qty += delta;
                if *qty <= 0 {
                    expected.remove(&id);
                }
            }
        }

        prop_assert!(state.items.iter().all(|line| line.qty >= 1));
        let actual: std::collections::BTreeMap<u64, i64> = state
            .items
            .iter()
            .map(|line| (line.id.value(), i64::from(line.qty)))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn discounts_never_compound(
        cents in positive_cents(),
        rates in prop::collection::vec(discount_basis_points(), 1..10),
    ) {
        let ids = SequentialIds::new();
        let mut state = BillingState::new();
        let original = Money::from_cents(cents);
        let add = BillingAction::add("Line", original, &ids, &test_clock()).unwrap();
        BillingReducer.reduce(&mut state, add, &());
        let id = ItemId::new(1);

        for bp in &rates {
            let action = BillingAction::apply_discount(id, rate(*bp)).unwrap();
            BillingReducer.reduce(&mut state, action, &());
        }

        let last = rate(*rates.last().unwrap());
        let item = state.items.get(id).unwrap();
        prop_assert_eq!(item.price, original.discounted_by(last));
        prop_assert_eq!(item.original_price, Some(original));

        BillingReducer.reduce(&mut state, BillingAction::RemoveDiscount { id }, &());
        let item = state.items.get(id).unwrap();
        prop_assert_eq!(item.price, original);
        prop_assert_eq!(item.original_price, None);
        prop_assert_eq!(item.discount, None);
    }

    #[test]
    fn clear_always_empties(state in cart_state()) {
        let mut state = state;
        CartReducer.reduce(&mut state, CartAction::Clear, &());
        prop_assert!(state.items.is_empty());
    }
}
