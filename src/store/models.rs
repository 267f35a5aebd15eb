use serde::{Deserialize, Serialize};

/// An NBA team in normalized form. Built once by the response mapper and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// `team-<upstream numeric id>`
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub abbreviation: String,
    pub city: String,
    pub conference: String,
    pub division: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameStatus {
    #[default]
    Scheduled,
    InProgress,
    Final,
    Postponed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Score {
    pub home: i64,
    pub away: i64,
}

/// Per-game detail that does not affect the scoreboard itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    /// Upstream season integer as its decimal string, e.g. "2024".
    pub season: String,
    pub upstream_id: u64,
    pub period: i64,
    pub postseason: bool,
    /// Game clock text, e.g. "Q4 2:31". Empty when the upstream sends none.
    pub time_remaining: String,
}

/// A normalized game. `id` is `<provider>-<upstream numeric id>`, so the same
/// upstream game always maps to the same internal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub provider: String,
    pub home_team: Team,
    pub away_team: Team,
    /// Upstream start time, passed through verbatim.
    pub start_time: String,
    pub status: GameStatus,
    pub score: Score,
    pub meta: GameMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub team_id: String,
}

/// One day's normalized slate, persisted as a single file under
/// `{data_dir}/games/{date}.json`. The date is carried inside the payload as
/// well as in the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub date: String,
    pub games: Vec<Game>,
}
