//! Badges: static catalog, unlock checks and the per-student award store

mod checker;
mod definitions;
mod evaluator;

pub use checker::{BadgeStats, check_all};
pub use definitions::{BADGES, Badge, BadgeCategory, BadgeId};
pub use evaluator::BadgeEvaluator;

use serde::Serialize;

/// A badge held by a student
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarnedBadge {
    pub id: BadgeId,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
    pub earned_at: i64,
}

impl EarnedBadge {
    pub fn new(id: BadgeId, earned_at: i64) -> Self {
        let badge = id.badge();
        Self {
            id,
            label: badge.label,
            description: badge.description,
            icon: badge.icon,
            category: badge.category,
            earned_at,
        }
    }
}
