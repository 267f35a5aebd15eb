use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::FetchError;
use crate::snapshot::SnapshotStore;
use crate::store::models::{Game, Snapshot, Team};
use crate::store::Store;
use crate::upstream::GameProvider;

/// Spawn the background task that refreshes the current slate at a fixed
/// interval: fetch today's games, swap them into the in-memory store and
/// persist the day's snapshot.
///
/// Backoff lives here, not in the provider: a rate-limited fetch sleeps out
/// the upstream's retry-after hint before the loop continues.
pub fn start_refresh_loop(
    provider: Arc<dyn GameProvider>,
    store: Store,
    snapshots: Arc<SnapshotStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Refresh loop started (provider={}, interval={:?})",
            provider.name(),
            interval
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match refresh_once(provider.as_ref(), &store, &snapshots).await {
                Ok(count) => info!("Refreshed {} games from {}", count, provider.name()),
                Err(FetchError::RateLimited(e)) => {
                    warn!(
                        "Provider '{}' rate limited (remaining={:?}), backing off {:?}",
                        provider.name(),
                        e.remaining,
                        e.retry_after
                    );
                    tokio::time::sleep(e.retry_after).await;
                }
                Err(e) => error!("Refresh from '{}' failed: {}", provider.name(), e),
            }
        }
    })
}

/// One refresh pass. Returns the number of games fetched.
///
/// The in-memory swap happens even if the snapshot write then fails; serving
/// current data takes priority over persistence, so that failure is only
/// logged.
pub async fn refresh_once(
    provider: &dyn GameProvider,
    store: &Store,
    snapshots: &SnapshotStore,
) -> Result<usize, FetchError> {
    let date = provider.resolve_date(None, None);
    let games = provider.fetch_games(Some(&date), None).await?;
    let count = games.len();

    let snapshot = Snapshot {
        date: date.clone(),
        games: games.clone(),
    };
    store.replace_teams(collect_teams(&games));
    store.replace_games(games);

    if let Err(e) = snapshots.write_snapshot(&date, &snapshot) {
        error!("Snapshot write for {} failed: {}", date, e);
    }
    Ok(count)
}

/// Unique teams appearing in the slate, ordered by id.
fn collect_teams(games: &[Game]) -> Vec<Team> {
    let mut seen: BTreeMap<String, Team> = BTreeMap::new();
    for game in games {
        for team in [&game.home_team, &game.away_team] {
            seen.entry(team.id.clone()).or_insert_with(|| team.clone());
        }
    }
    seen.into_values().collect()
}
