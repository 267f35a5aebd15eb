pub mod models;

use std::sync::{Arc, RwLock};

use models::{Game, Player, Team};

/// Shared in-memory read store behind the API. The refresher replaces whole
/// collections at once; readers get clones. Last write wins.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    games: Vec<Game>,
    teams: Vec<Team>,
    players: Vec<Player>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_games(&self) -> Vec<Game> {
        self.inner.read().unwrap().games.clone()
    }

    pub fn game(&self, id: &str) -> Option<Game> {
        self.inner
            .read()
            .unwrap()
            .games
            .iter()
            .find(|g| g.id == id)
            .cloned()
    }

    pub fn replace_games(&self, games: Vec<Game>) {
        self.inner.write().unwrap().games = games;
    }

    pub fn list_teams(&self) -> Vec<Team> {
        self.inner.read().unwrap().teams.clone()
    }

    pub fn team(&self, id: &str) -> Option<Team> {
        self.inner
            .read()
            .unwrap()
            .teams
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn replace_teams(&self, teams: Vec<Team>) {
        self.inner.write().unwrap().teams = teams;
    }

    pub fn list_players(&self) -> Vec<Player> {
        self.inner.read().unwrap().players.clone()
    }

    pub fn player(&self, id: &str) -> Option<Player> {
        self.inner
            .read()
            .unwrap()
            .players
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn replace_players(&self, players: Vec<Player>) {
        self.inner.write().unwrap().players = players;
    }
}
