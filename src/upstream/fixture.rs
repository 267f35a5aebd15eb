use std::sync::Arc;

use async_trait::async_trait;

use super::{effective_date, GameProvider};
use crate::clock::Clock;
use crate::error::FetchError;
use crate::store::models::{Game, GameMeta, GameStatus, Player, Score, Team};

pub const PROVIDER_NAME: &str = "fixture";

/// Offline provider serving a small fixed slate. Used for development and
/// demos when no upstream API key is at hand.
pub struct FixtureProvider {
    clock: Arc<dyn Clock>,
    default_timezone: String,
}

impl FixtureProvider {
    pub fn new(clock: Arc<dyn Clock>, default_timezone: String) -> Self {
        FixtureProvider {
            clock,
            default_timezone,
        }
    }
}

#[async_trait]
impl GameProvider for FixtureProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn resolve_date(&self, date: Option<&str>, timezone: Option<&str>) -> String {
        effective_date(self.clock.as_ref(), date, timezone, &self.default_timezone)
    }

    async fn fetch_games(
        &self,
        date: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<Vec<Game>, FetchError> {
        let date = self.resolve_date(date, timezone);
        Ok(slate(&date))
    }
}

fn team(id: u64, name: &str, full_name: &str, abbr: &str, city: &str) -> Team {
    Team {
        id: format!("team-{id}"),
        name: name.into(),
        full_name: full_name.into(),
        abbreviation: abbr.into(),
        city: city.into(),
        conference: "East".into(),
        division: "Atlantic".into(),
    }
}

/// The fixed slate, keyed to whatever date was asked for.
pub fn slate(date: &str) -> Vec<Game> {
    let celtics = team(1, "Celtics", "Boston Celtics", "BOS", "Boston");
    let knicks = team(2, "Knicks", "New York Knicks", "NYK", "New York");
    let nets = team(3, "Nets", "Brooklyn Nets", "BKN", "Brooklyn");
    let sixers = team(4, "76ers", "Philadelphia 76ers", "PHI", "Philadelphia");

    vec![
        Game {
            id: format!("{PROVIDER_NAME}-1"),
            provider: PROVIDER_NAME.into(),
            home_team: celtics,
            away_team: knicks,
            start_time: format!("{date}T00:00:00Z"),
            status: GameStatus::Final,
            score: Score { home: 112, away: 104 },
            meta: GameMeta {
                season: "2023".into(),
                upstream_id: 1,
                period: 4,
                postseason: false,
                time_remaining: "Final".into(),
            },
        },
        Game {
            id: format!("{PROVIDER_NAME}-2"),
            provider: PROVIDER_NAME.into(),
            home_team: nets,
            away_team: sixers,
            start_time: format!("{date}T00:30:00Z"),
            status: GameStatus::Scheduled,
            score: Score::default(),
            meta: GameMeta {
                season: "2023".into(),
                upstream_id: 2,
                period: 0,
                postseason: false,
                time_remaining: String::new(),
            },
        },
    ]
}

/// Companion roster for the fixture slate.
pub fn players() -> Vec<Player> {
    vec![
        Player {
            id: "player-1".into(),
            first_name: "Jayson".into(),
            last_name: "Tatum".into(),
            position: "F".into(),
            team_id: "team-1".into(),
        },
        Player {
            id: "player-2".into(),
            first_name: "Jalen".into(),
            last_name: "Brunson".into(),
            position: "G".into(),
            team_id: "team-2".into(),
        },
        Player {
            id: "player-3".into(),
            first_name: "Mikal".into(),
            last_name: "Bridges".into(),
            position: "F".into(),
            team_id: "team-3".into(),
        },
    ]
}
