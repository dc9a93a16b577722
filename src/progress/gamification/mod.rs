//! Gamification: levels, streaks, badges, daily challenges and the leaderboard
//!
//! Everything here works on a borrowed `&Connection` so the engine can run
//! several components inside one transaction.

pub mod badges;
mod challenges;
pub mod leaderboard;
mod levels;
mod streaks;

pub use badges::{BADGES, Badge, BadgeCategory, BadgeEvaluator, BadgeId, BadgeStats, EarnedBadge};
pub use challenges::DailyChallengeScheduler;
pub use leaderboard::{LeaderboardEntry, LeaderboardPeriod, LeaderboardRanker};
pub use levels::{LEVELS, Level, LevelProgress};
pub use streaks::{FREEZE_EVERY_DAYS, StreakChange, StreakState, StreakTracker, StreakUpdate};
