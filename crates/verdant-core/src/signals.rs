//! Latest-value caches for externally pushed sensor state.
//!
//! Connectivity and geolocation arrive from long-lived background
//! subscriptions the core does not control. Each cache holds only the most
//! recent value; decision points sample it and must treat the sample as
//! arbitrarily stale. Nothing here blocks or awaits a sensor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::GeoFix;

/// Shared online/offline flag, pushed by a connectivity watcher.
#[derive(Clone, Debug)]
pub struct Connectivity {
    online: Arc<AtomicBool>,
}

impl Connectivity {
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Sample the current online state
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Push a new state; returns the previous one
    pub fn replace(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::Relaxed)
    }
}

impl Default for Connectivity {
    /// Assume online until a watcher says otherwise
    fn default() -> Self {
        Self::new(true)
    }
}

/// Shared most-recent GPS fix, pushed by a position watcher.
///
/// `None` means "no fix yet" — a valid state that never blocks capture.
#[derive(Clone, Debug, Default)]
pub struct LatestFix {
    fix: Arc<Mutex<Option<GeoFix>>>,
}

impl LatestFix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh fix from the watcher
    pub fn update(&self, fix: GeoFix) {
        if let Ok(mut guard) = self.fix.lock() {
            *guard = Some(fix);
        }
    }

    /// Drop the cached fix (e.g. the watcher reported a hard error)
    pub fn clear(&self) {
        if let Ok(mut guard) = self.fix.lock() {
            *guard = None;
        }
    }

    /// Sample the most recent fix, if any
    #[must_use]
    pub fn sample(&self) -> Option<GeoFix> {
        self.fix.lock().map(|guard| *guard).unwrap_or(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_replace_reports_previous() {
        let connectivity = Connectivity::new(false);
        assert!(!connectivity.is_online());
        assert!(!connectivity.replace(true));
        assert!(connectivity.is_online());
        assert!(connectivity.replace(true));
    }

    #[test]
    fn test_connectivity_shared_between_clones() {
        let connectivity = Connectivity::new(true);
        let watcher_handle = connectivity.clone();
        watcher_handle.replace(false);
        assert!(!connectivity.is_online());
    }

    #[test]
    fn test_latest_fix_starts_empty() {
        let latest = LatestFix::new();
        assert_eq!(latest.sample(), None);
    }

    #[test]
    fn test_latest_fix_update_and_clear() {
        let latest = LatestFix::new();
        let fix = GeoFix {
            latitude: -2.9,
            longitude: 115.2,
            accuracy_m: 3.0,
        };
        latest.update(fix);
        assert_eq!(latest.sample(), Some(fix));
        latest.clear();
        assert_eq!(latest.sample(), None);
    }
}
