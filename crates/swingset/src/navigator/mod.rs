//! Row navigation and the commit state machine.
//!
//! A [`DataNavigator`] moves its cursor between rows and decides, for every
//! command, whether pending edits are committed, discarded or block the
//! move. Button enablement is a pure function of [`NavigatorRowState`] and
//! the navigator settings; see [`compute`].
//!
//! Hosts customize transitions with a [`NavigationHook`], and can turn a
//! [`BoundSelection`](crate::binding::BoundSelection) into a row picker with
//! [`attach_navigation_selector`].

mod controller;
mod enablement;
mod hook;
mod selector;
mod state;

pub use controller::{DataNavigator, NavOutcome, NavigatorSignals};
pub use enablement::{ButtonStates, EnablementInputs, EnablementPolicy, compute};
pub use hook::{NavigationDirection, NavigationHook, NoopHook};
pub use selector::{NavigationSelector, attach_navigation_selector};
pub use state::{NavState, NavigatorRowState};
