//! The global store: every feature's state in one value, driven by one
//! combined reducer.
//!
//! Feature reducers are scoped onto their slice of [`AppState`] and combined.
//! An [`AppAction`] reaches exactly one feature; effects a feature returns
//! are lifted back into `AppAction` so their follow-up actions route home.

use crate::billing::{BillingAction, BillingReducer, BillingState};
use crate::blog::{BlogAction, BlogReducer, BlogState};
use crate::cart::{CartAction, CartReducer, CartState};
use crate::config::ShowcaseConfig;
use crate::notification::{NotificationAction, NotificationReducer, NotificationState};
use crate::registration::{RegistrationAction, RegistrationReducer, RegistrationState};
use cartwheel_core::composition::{combine_reducers, scope_reducer, BoxedReducer, CombinedReducer};
use cartwheel_core::effect::Effect;
use cartwheel_core::reducer::Reducer;
use cartwheel_core::SmallVec;
use cartwheel_runtime::{Store, StoreConfig};
use serde::{Deserialize, Serialize};

/// State of the whole application
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Blog posts
    pub blog: BlogState,
    /// Invoice lines
    pub billing: BillingState,
    /// Cart lines
    pub cart: CartState,
    /// Registration form
    pub registration: RegistrationState,
    /// Notification area
    pub notification: NotificationState,
}

/// An action for one feature
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppAction {
    /// Blog action
    Blog(BlogAction),
    /// Billing action
    Billing(BillingAction),
    /// Cart action
    Cart(CartAction),
    /// Registration action
    Registration(RegistrationAction),
    /// Notification action
    Notification(NotificationAction),
}

impl AppAction {
    fn into_blog(self) -> Option<BlogAction> {
        match self {
            Self::Blog(action) => Some(action),
            _ => None,
        }
    }

    fn into_billing(self) -> Option<BillingAction> {
        match self {
            Self::Billing(action) => Some(action),
            _ => None,
        }
    }

    fn into_cart(self) -> Option<CartAction> {
        match self {
            Self::Cart(action) => Some(action),
            _ => None,
        }
    }

    fn into_registration(self) -> Option<RegistrationAction> {
        match self {
            Self::Registration(action) => Some(action),
            _ => None,
        }
    }

    fn into_notification(self) -> Option<NotificationAction> {
        match self {
            Self::Notification(action) => Some(action),
            _ => None,
        }
    }
}

impl From<BlogAction> for AppAction {
    fn from(action: BlogAction) -> Self {
        Self::Blog(action)
    }
}

impl From<BillingAction> for AppAction {
    fn from(action: BillingAction) -> Self {
        Self::Billing(action)
    }
}

impl From<CartAction> for AppAction {
    fn from(action: CartAction) -> Self {
        Self::Cart(action)
    }
}

impl From<RegistrationAction> for AppAction {
    fn from(action: RegistrationAction) -> Self {
        Self::Registration(action)
    }
}

impl From<NotificationAction> for AppAction {
    fn from(action: NotificationAction) -> Self {
        Self::Notification(action)
    }
}

const fn blog_state(state: &mut AppState) -> &mut BlogState {
    &mut state.blog
}

const fn billing_state(state: &mut AppState) -> &mut BillingState {
    &mut state.billing
}

const fn cart_state(state: &mut AppState) -> &mut CartState {
    &mut state.cart
}

const fn registration_state(state: &mut AppState) -> &mut RegistrationState {
    &mut state.registration
}

const fn notification_state(state: &mut AppState) -> &mut NotificationState {
    &mut state.notification
}

const fn no_env(env: &()) -> &() {
    env
}

/// The application's combined reducer
pub struct AppReducer {
    inner: CombinedReducer<AppState, AppAction, ()>,
}

impl AppReducer {
    /// Builds the reducer tree from configuration
    #[must_use]
    pub fn new(config: &ShowcaseConfig) -> Self {
        let reducers: Vec<BoxedReducer<AppState, AppAction, ()>> = vec![
            Box::new(scope_reducer(
                BlogReducer::with_default_category(config.default_category.clone()),
                blog_state,
                AppAction::into_blog,
                AppAction::Blog,
                no_env,
            )),
            Box::new(scope_reducer(
                BillingReducer::new(),
                billing_state,
                AppAction::into_billing,
                AppAction::Billing,
                no_env,
            )),
            Box::new(scope_reducer(
                CartReducer::new(),
                cart_state,
                AppAction::into_cart,
                AppAction::Cart,
                no_env,
            )),
            Box::new(scope_reducer(
                RegistrationReducer::new(),
                registration_state,
                AppAction::into_registration,
                AppAction::Registration,
                no_env,
            )),
            Box::new(scope_reducer(
                NotificationReducer::with_lifetime(config.notification_lifetime()),
                notification_state,
                AppAction::into_notification,
                AppAction::Notification,
                no_env,
            )),
        ];

        Self {
            inner: combine_reducers(reducers),
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new(&ShowcaseConfig::default())
    }
}

impl std::fmt::Debug for AppReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppReducer")
            .field("features", &self.inner.len())
            .finish()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// The application store
pub type AppStore = Store<AppState, AppAction, (), AppReducer>;

/// Creates the application store from configuration
#[must_use]
pub fn app_store(initial: AppState, config: &ShowcaseConfig) -> AppStore {
    Store::with_config(initial, AppReducer::new(config), (), StoreConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Product;
    use crate::collection::ItemId;
    use crate::notification::dismiss_effect_id;
    use cartwheel_core::environment::Clock;
    use cartwheel_testing::{assertions, test_clock, ReducerTest};

    #[test]
    fn actions_reach_only_their_feature() {
        let laptop = Product::catalog().remove(0);

        ReducerTest::new(AppReducer::default())
            .with_env(())
            .given_state(AppState::default())
            .when_action(CartAction::add_or_increment(&laptop, &test_clock()).into())
            .then_state(|state| {
                assert_eq!(state.cart.item_count(), 1);
                assert!(state.billing.items.is_empty());
                assert!(state.blog.posts.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn notification_effects_are_lifted() {
        ReducerTest::new(AppReducer::default())
            .with_env(())
            .given_state(AppState::default())
            .when_action(NotificationAction::info("hello").into())
            .then_effects(|effects| {
                assertions::assert_cancels(effects, &dismiss_effect_id());
                let lifted = effects.iter().any(|effect| {
                    matches!(
                        effect,
                        Effect::Cancellable { effect, .. }
                            if matches!(
                                &**effect,
                                Effect::Delay { action, .. }
                                    if **action == AppAction::Notification(NotificationAction::Dismiss { id: 1 })
                            )
                    )
                });
                assert!(lifted, "dismiss should come back as an AppAction");
            })
            .run();
    }

    #[test]
    fn configured_category_reaches_blog() {
        let config = ShowcaseConfig {
            default_category: "notes".to_string(),
            ..ShowcaseConfig::default()
        };

        ReducerTest::new(AppReducer::new(&config))
            .with_env(())
            .given_state(AppState::default())
            .when_action(AppAction::Blog(BlogAction::Add {
                id: ItemId::new(1),
                post: crate::blog::NewPost::new("Title", "Body"),
                at: test_clock().now(),
            }))
            .then_state(|state| assert_eq!(state.blog.categories(), vec!["notes"]))
            .run();
    }
}
