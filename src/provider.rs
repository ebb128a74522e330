use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sample::{LocationSample, ProviderKind};

/// Platform location service.
///
/// Returns the latest fix the platform knows of for `kind`, or `None` when
/// there is no fix yet.
pub trait LocationProvider: Send {
    fn last_known(&self, kind: ProviderKind) -> Option<LocationSample>;
}

/// In-memory provider whose fixes are set by hand.
///
/// Clones share the same fixes, so one handle can feed a poller thread while
/// another updates it.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    fixes: Arc<Mutex<HashMap<ProviderKind, LocationSample>>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, kind: ProviderKind, sample: LocationSample) {
        self.fixes().insert(kind, sample);
    }

    pub fn forget(&self, kind: ProviderKind) {
        self.fixes().remove(&kind);
    }

    // A panic elsewhere cannot leave the map half-updated, so a poisoned
    // lock still holds usable fixes.
    fn fixes(&self) -> MutexGuard<'_, HashMap<ProviderKind, LocationSample>> {
        self.fixes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationProvider for StaticProvider {
    fn last_known(&self, kind: ProviderKind) -> Option<LocationSample> {
        self.fixes().get(&kind).cloned()
    }
}
