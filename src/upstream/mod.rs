pub mod balldontlie;
pub mod fixture;
pub mod map;

pub use balldontlie::{BallDontLie, BallDontLieConfig};
pub use fixture::FixtureProvider;

use async_trait::async_trait;
use chrono_tz::Tz;
use tracing::warn;

use crate::clock::Clock;
use crate::error::FetchError;
use crate::store::models::Game;

/// Trait every game provider implements.
#[async_trait]
pub trait GameProvider: Send + Sync {
    /// Fetch the slate for `date` (YYYY-MM-DD), or for "today" resolved in
    /// `timezone` when no date is given. Order is upstream order.
    async fn fetch_games(
        &self,
        date: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<Vec<Game>, FetchError>;

    /// The effective YYYY-MM-DD `fetch_games` would use for these arguments.
    fn resolve_date(&self, date: Option<&str>, timezone: Option<&str>) -> String;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Resolve the effective date: an explicit date always wins; otherwise "today"
/// in the requested timezone, falling back to the configured default and then
/// to UTC when the name does not resolve. Near midnight this is what decides
/// which day's slate "today" means.
pub(crate) fn effective_date(
    clock: &dyn Clock,
    date: Option<&str>,
    timezone: Option<&str>,
    default_tz: &str,
) -> String {
    if let Some(d) = date {
        return d.to_string();
    }
    let name = timezone.unwrap_or(default_tz);
    let tz: Tz = name.parse().unwrap_or_else(|_| {
        warn!("Unknown timezone '{}', resolving today in UTC", name);
        Tz::UTC
    });
    clock
        .now()
        .with_timezone(&tz)
        .format("%Y-%m-%d")
        .to_string()
}
