//! Pure mapping from upstream wire rows to the normalized domain shapes.
//! Total over any well-formed row; no I/O, no failure cases.

use super::balldontlie::{GameRow, TeamRow};
use crate::store::models::{Game, GameMeta, GameStatus, Score, Team};

pub fn map_game(provider: &str, row: &GameRow) -> Game {
    Game {
        id: format!("{}-{}", provider, row.id),
        provider: provider.to_string(),
        home_team: map_team(&row.home_team),
        away_team: map_team(&row.visitor_team),
        start_time: row.date.clone(),
        status: map_status(&row.status),
        score: Score {
            home: row.home_team_score,
            away: row.visitor_team_score,
        },
        meta: GameMeta {
            season: row.season.to_string(),
            upstream_id: row.id,
            period: row.period,
            postseason: row.postseason,
            time_remaining: row.time.as_deref().unwrap_or("").trim().to_string(),
        },
    }
}

pub fn map_team(row: &TeamRow) -> Team {
    Team {
        id: format!("team-{}", row.id),
        name: row.name.clone(),
        full_name: row.full_name.clone(),
        abbreviation: row.abbreviation.clone(),
        city: row.city.clone(),
        conference: row.conference.clone(),
        division: row.division.clone(),
    }
}

/// Upstream status text → `GameStatus`. Anything unrecognized (including the
/// raw tip-off timestamps the upstream sends for unstarted games) is
/// `Scheduled`.
pub fn map_status(raw: &str) -> GameStatus {
    match raw.trim().to_lowercase().as_str() {
        "final" | "ended" => GameStatus::Final,
        "in progress" | "halftime" | "end of period" => GameStatus::InProgress,
        "postponed" => GameStatus::Postponed,
        "canceled" | "cancelled" => GameStatus::Canceled,
        _ => GameStatus::Scheduled,
    }
}
