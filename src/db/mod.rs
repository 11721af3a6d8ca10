//! Database layer (remote data gateway).

pub mod gateway;

pub use gateway::GatewayDb;

/// Table names as constants.
pub mod tables {
    pub const GAMES: &str = "games";
    pub const CHALLENGES: &str = "challenges";
    pub const PROFILES: &str = "profiles";
    /// Per-game achievements (counted on the dashboard)
    pub const ACHIEVEMENTS: &str = "achievements";
}
