//! Selection & Persistence Controller
//!
//! Single writer of the active site id. Every change is written to durable
//! storage, mirrored into the navigation state and published once to
//! subscribers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use atlasfield_core::SiteId;
use tokio::sync::watch;
use tracing::{debug, info};

use super::navigation::Navigator;
use super::resolver::{parse_site_param, resolve_active_site, SelectionSource};
use crate::storage::SelectionStore;
use crate::utils::error::{AppError, AppResult};

/// Owns the active selection
pub struct SelectionController {
    store: SelectionStore,
    navigator: Arc<dyn Navigator>,
    known: RwLock<Vec<SiteId>>,
    active_tx: watch::Sender<Option<SiteId>>,
    /// Set while a change is being applied; navigation events raised by our
    /// own replacement are ignored
    applying: AtomicBool,
}

/// Clears the re-entrancy flag on every exit path
struct ApplyGuard<'a>(&'a AtomicBool);

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SelectionController {
    pub fn new(store: SelectionStore, navigator: Arc<dyn Navigator>) -> Self {
        let (active_tx, _) = watch::channel(None);
        Self {
            store,
            navigator,
            known: RwLock::new(Vec::new()),
            active_tx,
            applying: AtomicBool::new(false),
        }
    }

    /// Resolve the active site for a freshly loaded site list
    pub fn initialize(&self, site_ids: &[SiteId]) -> Option<SiteId> {
        self.set_known(site_ids);

        let navigation = parse_site_param(self.navigator.site_param().as_deref());
        let stored = self.store.load();
        let resolution = resolve_active_site(navigation, stored, site_ids);
        info!(
            site_id = ?resolution.site_id,
            source = ?resolution.source,
            "Resolved active site"
        );

        self.apply(resolution.site_id);
        resolution.site_id
    }

    /// User-driven selection; the id must belong to the loaded set
    ///
    /// Returns whether the active site changed.
    pub fn select(&self, site_id: SiteId) -> AppResult<bool> {
        if !self.is_known(site_id) {
            return Err(AppError::not_found(format!("Site {} is not loaded", site_id)));
        }
        Ok(self.apply(Some(site_id)))
    }

    /// Reconcile an externally changed navigation parameter
    ///
    /// Ignored while the controller is applying its own change, and for
    /// parameters that do not name a loaded site.
    pub fn on_navigation_changed(&self, param: Option<&str>) -> bool {
        if self.applying.load(Ordering::SeqCst) {
            debug!(?param, "Ignoring navigation event raised by own update");
            return false;
        }

        match parse_site_param(param) {
            Some(site_id) if self.is_known(site_id) => self.apply(Some(site_id)),
            _ => {
                debug!(?param, "Navigation parameter does not name a loaded site");
                false
            }
        }
    }

    /// Re-validate the active id after the site list was refreshed
    pub fn set_sites(&self, site_ids: &[SiteId]) -> Option<SiteId> {
        self.set_known(site_ids);

        let current = self.active();
        if let Some(id) = current.filter(|id| site_ids.contains(id)) {
            return Some(id);
        }

        let resolution = resolve_active_site(None, None, site_ids);
        if resolution.source == SelectionSource::Fallback {
            info!(previous = ?current, site_id = ?resolution.site_id, "Active site disappeared, falling back");
        }
        self.apply(resolution.site_id);
        resolution.site_id
    }

    pub fn active(&self) -> Option<SiteId> {
        *self.active_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SiteId>> {
        self.active_tx.subscribe()
    }

    /// Whether durable persistence has degraded to session-only
    pub fn is_storage_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    fn apply(&self, site_id: Option<SiteId>) -> bool {
        if self.applying.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _guard = ApplyGuard(&self.applying);

        if self.active() == site_id {
            return false;
        }

        self.store.save(site_id);
        self.navigator.replace_site_param(site_id);
        self.active_tx.send_replace(site_id);
        debug!(?site_id, "Active site changed");
        true
    }

    fn set_known(&self, site_ids: &[SiteId]) {
        let mut known = self.known.write().unwrap_or_else(|e| e.into_inner());
        *known = site_ids.to_vec();
    }

    fn is_known(&self, site_id: SiteId) -> bool {
        self.known
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&site_id)
    }
}
