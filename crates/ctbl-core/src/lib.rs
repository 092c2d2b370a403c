// Library root: sabermetric ratings and batting-order construction for
// amateur-league box-score data.

pub mod config;
pub mod leaderboard;
pub mod lineup;
pub mod metrics;
pub mod roster;
