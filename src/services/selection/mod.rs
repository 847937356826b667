//! Active Site Selection
//!
//! Resolves which site is in focus and keeps durable storage and the
//! navigation state in sync with it.

pub mod controller;
pub mod navigation;
pub mod resolver;

pub use controller::SelectionController;
pub use navigation::{MemoryNavigator, NavigationListener, Navigator};
pub use resolver::{parse_site_param, resolve_active_site, Resolution, SelectionSource};
