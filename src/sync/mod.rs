use crate::error::SyncError;
use crate::models::{MovieDetail, TmdbId};
use crate::radarr::RadarrClient;
use crate::tmdb::TmdbClient;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

/// The reconciliation loop: sleep for the configured interval, run one
/// cycle, repeat forever. A failed cycle is logged and the loop carries on;
/// the next cycle recomputes everything from scratch.
pub struct SyncRunner {
    tmdb: TmdbClient,
    radarr: RadarrClient,
    interval: Duration,
}

impl SyncRunner {
    pub fn new(tmdb: TmdbClient, radarr: RadarrClient, interval: Duration) -> Self {
        Self {
            tmdb,
            radarr,
            interval,
        }
    }

    pub async fn run(&self) {
        loop {
            info!("Sleeping for {} seconds", self.interval.as_secs());
            sleep(self.interval).await;

            if let Err(e) = self.run_cycle().await {
                error!("Sync cycle failed: {}", e);
            }
        }
    }

    /// One fetch-diff-resolve-submit cycle. The stages are strictly
    /// sequential; only work within a stage runs concurrently.
    async fn run_cycle(&self) -> Result<(), SyncError> {
        let listed = self.tmdb.listed_ids().await?;
        let managed = self.radarr.managed_ids().await?;
        info!("Retrieved {} movies from Radarr", managed.len());

        let missing = missing_ids(&listed, &managed);
        if missing.is_empty() {
            info!("No movies to add to Radarr");
            return Ok(());
        }
        info!("{} movies to add with TMDB IDs: {:?}", missing.len(), missing);

        // Release dates on the list payload are unreliable; resolve each
        // movie against the detail endpoint before submitting.
        let lookups = missing.iter().map(|&id| self.tmdb.movie_detail(id));
        let details: Vec<MovieDetail> = join_all(lookups).await.into_iter().flatten().collect();
        info!("{} movie(s) eligible to be added to Radarr", details.len());

        // Submissions are fire-and-forget per movie, but the whole batch is
        // awaited so the cycle has a defined end before the next sleep.
        join_all(details.iter().map(|detail| self.radarr.add_movie(detail))).await;

        Ok(())
    }
}

/// `listed − managed`: the ids to acquire. This system only ever adds,
/// never removes, so the difference is one-directional.
pub fn missing_ids(listed: &HashSet<TmdbId>, managed: &HashSet<TmdbId>) -> HashSet<TmdbId> {
    listed.difference(managed).copied().collect()
}
