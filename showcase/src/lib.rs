//! # Cartwheel
//!
//! Blog posts, invoice lines and a shopping cart, each kept in an ordered,
//! id-keyed collection and changed only through a pure reducer.
//!
//! Three ways of holding that state are shown side by side:
//!
//! 1. **Local state**: own a [`Collection`] and call its methods
//! 2. **Reducer-local state**: own a feature state and feed actions to its
//!    reducer directly
//! 3. **Global store**: one [`AppStore`] owns every feature's state; callers
//!    share it by cloning the handle
//!
//! ## Example
//!
//! ```
//! use cartwheel::cart::{CartAction, CartReducer, CartState, Product};
//! use cartwheel::money::Rate;
//! use cartwheel_core::environment::SystemClock;
//! use cartwheel_core::reducer::Reducer;
//!
//! let laptop = Product::catalog().remove(0);
//! let mut cart = CartState::new();
//!
//! CartReducer.reduce(&mut cart, CartAction::add_or_increment(&laptop, &SystemClock), &());
//! CartReducer.reduce(&mut cart, CartAction::add_or_increment(&laptop, &SystemClock), &());
//!
//! let totals = cart.totals(Rate::from_percent(10).unwrap_or(Rate::ZERO));
//! assert_eq!(totals.total.to_string(), "$2640.00");
//! ```

pub mod app;
pub mod billing;
pub mod blog;
pub mod cart;
pub mod collection;
pub mod config;
pub mod money;
pub mod notification;
pub mod registration;
pub mod validation;

pub use app::{app_store, AppAction, AppReducer, AppState, AppStore};
pub use collection::{Collection, Entity, ItemId};
pub use config::{ConfigError, ShowcaseConfig};
pub use money::{Money, Rate, RateError, Totals};
pub use validation::ValidationError;
