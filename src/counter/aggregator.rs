//! Fan-out of a single visit into the three counter updates
//!
//! Each update runs as its own tokio task and returns its own outcome. The
//! request waits for all three, then merges the outcomes on its own task, so
//! no result state is shared between the updates.
//!
//! A failed update is logged and reported as `"0"`; it never fails the
//! request or affects its siblings. Spawned updates keep running if the
//! request itself is dropped, so a disconnecting client still gets counted.

use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::counter::keys::KeyNamer;
use crate::counter::models::{CounterSnapshot, Visit};
use crate::storage::{CounterStore, StoreResult};

pub struct CounterAggregator {
    store: Arc<dyn CounterStore>,
    keys: KeyNamer,
}

impl CounterAggregator {
    pub fn new(store: Arc<dyn CounterStore>, keys: KeyNamer) -> Self {
        Self { store, keys }
    }

    /// Count `visit` and return the resulting counter values.
    ///
    /// Waits for all three updates; there is no partial-result fast path and no
    /// timeout beyond the store client's own.
    pub async fn record(&self, visit: &Visit) -> CounterSnapshot {
        let site_uv = tokio::spawn(count_unique_visitor(
            Arc::clone(&self.store),
            self.keys.site_uv(&visit.site),
            visit.visitor_id.clone(),
        ));
        let site_pv = tokio::spawn(increment(
            Arc::clone(&self.store),
            self.keys.site_pv(),
            visit.site.clone(),
        ));
        let page_pv = tokio::spawn(increment(
            Arc::clone(&self.store),
            self.keys.page_pv(&visit.site),
            visit.path.clone(),
        ));

        let (site_uv, site_pv, page_pv) = tokio::join!(site_uv, site_pv, page_pv);

        let snapshot = CounterSnapshot::from_outcomes(
            settle("site_uv", &visit.site, site_uv),
            settle("site_pv", &visit.site, site_pv),
            settle("page_pv", &visit.site, page_pv),
        );
        debug!(site = %visit.site, path = %visit.path, ?snapshot, "visit counted");
        snapshot
    }
}

/// Add the visitor to the site's set, then read the set size.
///
/// The two steps are separate store calls, so the size may already include
/// visitors added by concurrent requests.
async fn count_unique_visitor(
    store: Arc<dyn CounterStore>,
    key: String,
    visitor_id: String,
) -> StoreResult<i64> {
    if let Err(err) = store.set_add(&key, &visitor_id).await {
        // Still report the current size
        warn!(key = %key, error = %err, "failed to add unique visitor");
    }
    store.set_card(&key).await
}

async fn increment(store: Arc<dyn CounterStore>, key: String, field: String) -> StoreResult<i64> {
    store.hash_incr(&key, &field, 1).await
}

fn settle(
    counter: &'static str,
    site: &str,
    joined: Result<StoreResult<i64>, JoinError>,
) -> Option<i64> {
    match joined {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            error!(counter, site = %site, error = %err, "counter update failed");
            None
        }
        Err(err) => {
            error!(counter, site = %site, error = %err, "counter task did not complete");
            None
        }
    }
}
