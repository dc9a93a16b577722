//! CLI command implementations

pub mod init;
pub mod leaderboard;
pub mod repair;
pub mod seed;
pub mod serve;
pub mod student;
