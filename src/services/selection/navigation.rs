//! Navigation State
//!
//! The navigation-state representation of the active site (a query parameter
//! in a browser router). Replacing the parameter must not create a new history
//! entry.

use std::sync::{Arc, RwLock};

use atlasfield_core::SiteId;

/// Callback a router fires when its parameter changes
pub type NavigationListener = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Read and replace the site parameter of the current navigation state
pub trait Navigator: Send + Sync {
    /// Raw parameter value, if present
    fn site_param(&self) -> Option<String>;

    /// Replace the parameter in place; `None` removes it
    fn replace_site_param(&self, site_id: Option<SiteId>);
}

/// In-process navigator
///
/// Like a browser router it notifies its listener for every change,
/// including programmatic replacements.
#[derive(Default)]
pub struct MemoryNavigator {
    param: RwLock<Option<String>>,
    replacements: RwLock<usize>,
    listener: RwLock<Option<NavigationListener>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigator that starts with the given raw parameter
    pub fn with_param(param: impl Into<String>) -> Self {
        let navigator = Self::default();
        *navigator.param.write().unwrap_or_else(|e| e.into_inner()) = Some(param.into());
        navigator
    }

    pub fn set_listener(&self, listener: NavigationListener) {
        *self.listener.write().unwrap_or_else(|e| e.into_inner()) = Some(listener);
    }

    /// Simulate the user navigating (back button, edited URL)
    pub fn navigate(&self, param: Option<&str>) {
        *self.param.write().unwrap_or_else(|e| e.into_inner()) = param.map(str::to_string);
        self.notify(param);
    }

    /// Number of in-place replacements performed so far
    pub fn replacement_count(&self) -> usize {
        *self.replacements.read().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, param: Option<&str>) {
        // Clone out so the listener may call back into the navigator
        let listener = self
            .listener
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(listener) = listener {
            listener(param);
        }
    }
}

impl Navigator for MemoryNavigator {
    fn site_param(&self) -> Option<String> {
        self.param.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace_site_param(&self, site_id: Option<SiteId>) {
        let param = site_id.map(|id| id.to_string());
        *self.param.write().unwrap_or_else(|e| e.into_inner()) = param.clone();
        *self.replacements.write().unwrap_or_else(|e| e.into_inner()) += 1;
        self.notify(param.as_deref());
    }
}
