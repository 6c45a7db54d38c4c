use std::sync::{Arc, RwLock};

use tessera_partition::OrganizedWorld;

#[derive(Default)]
struct Published {
    rev: u64,
    world: Option<Arc<OrganizedWorld>>,
}

/// Read handle to the current world. Readers clone out an `Arc` snapshot and
/// never see a partially built world; a new build replaces the inner `Arc`
/// in a single write.
#[derive(Clone, Default)]
pub struct SharedWorld {
    inner: Arc<RwLock<Published>>,
}

impl SharedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<OrganizedWorld>> {
        let guard = self.inner.read().ok()?;
        guard.world.clone()
    }

    /// Revision of the published world, 0 before the first publish.
    pub fn revision(&self) -> u64 {
        self.inner.read().map(|g| g.rev).unwrap_or(0)
    }

    /// Swaps in `world` if `rev` is newer than the published revision.
    pub fn publish(&self, rev: u64, world: OrganizedWorld) -> bool {
        let world = Arc::new(world);
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if rev <= guard.rev {
            log::debug!(
                target: "runtime",
                "dropping stale build rev {} (published {})",
                rev,
                guard.rev
            );
            return false;
        }
        guard.rev = rev;
        guard.world = Some(world);
        log::info!(target: "runtime", "published world rev {}", rev);
        true
    }
}
