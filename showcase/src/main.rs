//! Walks through the three state idioms and prints the results.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin cartwheel-demo
//!
//! # Different tax, more logging
//! CARTWHEEL_CART_TAX_RATE=0.2 RUST_LOG=cartwheel_runtime=trace cargo run --bin cartwheel-demo
//! ```

use cartwheel::billing::{next_discount, BillingAction, BillingState};
use cartwheel::blog::{BlogAction, BlogState, NewPost};
use cartwheel::cart::{CartAction, Product};
use cartwheel::collection::{Collection, ItemId};
use cartwheel::notification::NotificationAction;
use cartwheel::registration::{Field, RegistrationAction};
use cartwheel::{app_store, AppAction, AppState, Money, ShowcaseConfig};
use cartwheel_core::environment::{Clock, SequentialIds, SystemClock};
use cartwheel_core::reducer::Reducer;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cartwheel=debug,cartwheel_runtime=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ShowcaseConfig::from_env();
    config.validate()?;
    info!(
        billing_tax = %config.billing.tax_rate,
        cart_tax = %config.cart.tax_rate,
        discount_step = %config.discount_step,
        "=== Cartwheel demo ==="
    );

    let ids = SequentialIds::new();
    let clock = SystemClock;

    local_state(&clock);
    reducer_state(&config, &ids, &clock)?;
    global_store(&config, &ids, &clock).await?;

    Ok(())
}

/// Idiom 1: a collection owned and mutated directly
fn local_state(clock: &SystemClock) {
    info!("--- Local state ---");

    let mut cart = cartwheel::cart::CartState::new();
    let mut catalog: Collection<Product> = Collection::new();
    for product in Product::catalog() {
        catalog.push(product);
    }

    for product in catalog.iter().take(2) {
        cart.items.push(cartwheel::cart::CartItem {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            qty: 1,
            added_at: clock.now(),
        });
    }
    cart.items.retain(|line| line.price > Money::from_dollars(100));

    info!(lines = cart.items.len(), subtotal = %cart.subtotal(), "Cart kept by hand");
}

/// Idiom 2: feature state owned locally, changed through its reducer
fn reducer_state(
    config: &ShowcaseConfig,
    ids: &SequentialIds,
    clock: &SystemClock,
) -> anyhow::Result<()> {
    info!("--- Reducer-local state ---");

    let reducer = cartwheel::billing::BillingReducer::new();
    let mut billing = BillingState::new();

    let desk = BillingAction::add("Standing desk", Money::from_dollars(450), ids, clock)?;
    let BillingAction::Add { id, .. } = &desk else {
        anyhow::bail!("add builds an Add action");
    };
    let id = *id;
    reducer.reduce(&mut billing, desk, &());
    reducer.reduce(
        &mut billing,
        BillingAction::add("Monitor", Money::from_cents(22_950), ids, clock)?,
        &(),
    );

    // Two clicks on the discount button
    let mut discount = None;
    for _ in 0..2 {
        let rate = next_discount(discount, config.discount_step);
        discount = Some(rate);
        reducer.reduce(&mut billing, BillingAction::apply_discount(id, rate)?, &());
    }

    let totals = billing.totals(config.billing.tax_rate);
    info!(
        discounted = billing.discounted_count(),
        %totals,
        "Invoice after two discount steps"
    );

    if let Err(error) = BillingAction::add("", Money::from_dollars(1), ids, clock) {
        warn!(%error, "Rejected before dispatch");
    }

    Ok(())
}

/// Idiom 3: one store owning every feature, shared by handle
async fn global_store(
    config: &ShowcaseConfig,
    ids: &SequentialIds,
    clock: &SystemClock,
) -> anyhow::Result<()> {
    info!("--- Global store ---");

    let initial = AppState {
        blog: BlogState::with_welcome_post(ids, clock),
        ..AppState::default()
    };
    let store = app_store(initial, config);

    // A stand-in view: re-read state after every action
    let mut actions = store.subscribe_actions();
    let view = store.clone();
    let renderer = tokio::spawn(async move {
        while let Ok(action) = actions.recv().await {
            let (lines, posts) = view
                .state(|s| (s.cart.item_count(), s.blog.posts.len()))
                .await;
            tracing::debug!(?action, lines, posts, "Re-render");
        }
    });

    let laptop = Product::catalog().remove(0);
    store.send(CartAction::add_or_increment(&laptop, clock).into()).await?;
    store.send(CartAction::add_or_increment(&laptop, clock).into()).await?;
    store
        .send(NotificationAction::success("Laptop added to cart").into())
        .await?;

    match BlogAction::add(NewPost::new("  ", "untitled"), ids, clock) {
        Ok(action) => {
            store.send(action.into()).await?;
        },
        Err(error) => {
            store.send(NotificationAction::error(error.to_string()).into()).await?;
        },
    }

    for (field, value) in [
        (Field::Name, "Ada Lovelace"),
        (Field::Email, "ada@example.com"),
        (Field::Password, "analytical"),
        (Field::ConfirmPassword, "analytical"),
    ] {
        store
            .send(AppAction::Registration(RegistrationAction::SetField {
                field,
                value: value.to_string(),
            }))
            .await?;
    }
    store.send(RegistrationAction::ToggleTerms.into()).await?;
    store
        .send(RegistrationAction::Submit { at: clock.now() }.into())
        .await?;

    store
        .send(CartAction::UpdateQty { id: ItemId::new(1), delta: -1 }.into())
        .await?;

    let snapshot = store.snapshot().await;
    info!(
        cart = %snapshot.cart.totals(config.cart.tax_rate),
        posts = snapshot.blog.posts.len(),
        registrations = snapshot.registration.registrations.len(),
        notification = ?snapshot.notification.current.as_ref().map(|n| n.message.as_str()),
        "Final state"
    );

    store.shutdown(Duration::from_secs(5)).await?;
    drop(store);
    renderer.abort();

    Ok(())
}
