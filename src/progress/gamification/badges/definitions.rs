//! Badge catalog
//!
//! The catalog is static. Badges carry no XP.

use serde::Serialize;

/// Unique identifier for each badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    // General
    FirstSteps,
    KnowledgeSeeker,
    AllRounder,
    CuriousMind,
    Graduate,
    RocketStart,

    // Quiz
    QuickLearner,
    Perfectionist,
    DiamondMind,
    ComebackKid,

    // Streak
    WeekWarrior,

    // Level
    RisingStar,
    Legend,

    // Engagement
    AiWhisperer,
    DeepThinker,
    FlashcardMaster,
    ChallengeChampion,

    // Time of day
    NightOwl,
    EarlyBird,

    // Ranking
    LeaderboardKing,

    // Track completion
    GameMaster,
    BusinessBrain,
    CodeWizard,
    AiPioneer,
}

impl BadgeId {
    /// String ID for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSteps => "first_steps",
            Self::KnowledgeSeeker => "knowledge_seeker",
            Self::AllRounder => "all_rounder",
            Self::CuriousMind => "curious_mind",
            Self::Graduate => "graduate",
            Self::RocketStart => "rocket_start",
            Self::QuickLearner => "quick_learner",
            Self::Perfectionist => "perfectionist",
            Self::DiamondMind => "diamond_mind",
            Self::ComebackKid => "comeback_kid",
            Self::WeekWarrior => "week_warrior",
            Self::RisingStar => "rising_star",
            Self::Legend => "legend",
            Self::AiWhisperer => "ai_whisperer",
            Self::DeepThinker => "deep_thinker",
            Self::FlashcardMaster => "flashcard_master",
            Self::ChallengeChampion => "challenge_champion",
            Self::NightOwl => "night_owl",
            Self::EarlyBird => "early_bird",
            Self::LeaderboardKing => "leaderboard_king",
            Self::GameMaster => "game_master",
            Self::BusinessBrain => "business_brain",
            Self::CodeWizard => "code_wizard",
            Self::AiPioneer => "ai_pioneer",
        }
    }

    /// Parse from database string
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    pub fn all() -> &'static [BadgeId] {
        &[
            Self::FirstSteps,
            Self::KnowledgeSeeker,
            Self::AllRounder,
            Self::CuriousMind,
            Self::Graduate,
            Self::RocketStart,
            Self::QuickLearner,
            Self::Perfectionist,
            Self::DiamondMind,
            Self::ComebackKid,
            Self::WeekWarrior,
            Self::RisingStar,
            Self::Legend,
            Self::AiWhisperer,
            Self::DeepThinker,
            Self::FlashcardMaster,
            Self::ChallengeChampion,
            Self::NightOwl,
            Self::EarlyBird,
            Self::LeaderboardKing,
            Self::GameMaster,
            Self::BusinessBrain,
            Self::CodeWizard,
            Self::AiPioneer,
        ]
    }

    pub fn badge(&self) -> &'static Badge {
        Badge::get(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    General,
    Quiz,
    Streak,
    TrackSpecific,
}

impl BadgeCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Quiz => "Quizzes",
            Self::Streak => "Streaks",
            Self::TrackSpecific => "Track",
        }
    }
}

/// Badge definition
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: BadgeId,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: BadgeCategory,
}

pub static BADGES: &[Badge] = &[
    Badge {
        id: BadgeId::FirstSteps,
        label: "First Steps",
        description: "Log in for the first time",
        icon: "👋",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::QuickLearner,
        label: "Quick Learner",
        description: "Get 5 correct answers in a row",
        icon: "⚡",
        category: BadgeCategory::Quiz,
    },
    Badge {
        id: BadgeId::Perfectionist,
        label: "Perfectionist",
        description: "Score 100% on a quiz",
        icon: "💯",
        category: BadgeCategory::Quiz,
    },
    Badge {
        id: BadgeId::DiamondMind,
        label: "Diamond Mind",
        description: "Get a perfect quiz score 5 times",
        icon: "💎",
        category: BadgeCategory::Quiz,
    },
    Badge {
        id: BadgeId::KnowledgeSeeker,
        label: "Knowledge Seeker",
        description: "Open 10 topics",
        icon: "📚",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::WeekWarrior,
        label: "Week Warrior",
        description: "Maintain a 7-day streak",
        icon: "🔥",
        category: BadgeCategory::Streak,
    },
    Badge {
        id: BadgeId::RisingStar,
        label: "Rising Star",
        description: "Reach Engineer level",
        icon: "⭐",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::Legend,
        label: "Legend",
        description: "Reach Legend level",
        icon: "👑",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::AiWhisperer,
        label: "AI Whisperer",
        description: "Ask the AI tutor 50 questions",
        icon: "🤖",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::DeepThinker,
        label: "Deep Thinker",
        description: "Ask the AI tutor 100 questions",
        icon: "🔮",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::CuriousMind,
        label: "Curious Mind",
        description: "Open every topic in your track",
        icon: "🧠",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::Graduate,
        label: "Graduate",
        description: "Complete your full learning track",
        icon: "🎓",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::GameMaster,
        label: "Game Master",
        description: "Complete the gaming track",
        icon: "🎮",
        category: BadgeCategory::TrackSpecific,
    },
    Badge {
        id: BadgeId::BusinessBrain,
        label: "Business Brain",
        description: "Complete the business track",
        icon: "💼",
        category: BadgeCategory::TrackSpecific,
    },
    Badge {
        id: BadgeId::CodeWizard,
        label: "Code Wizard",
        description: "Complete the developer track",
        icon: "🧙",
        category: BadgeCategory::TrackSpecific,
    },
    Badge {
        id: BadgeId::AiPioneer,
        label: "AI Pioneer",
        description: "Complete the AI enthusiast track",
        icon: "🛰️",
        category: BadgeCategory::TrackSpecific,
    },
    Badge {
        id: BadgeId::LeaderboardKing,
        label: "Leaderboard King",
        description: "Reach #1 on the leaderboard",
        icon: "🏆",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::NightOwl,
        label: "Night Owl",
        description: "Study between 10 PM and 4 AM",
        icon: "🦉",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::EarlyBird,
        label: "Early Bird",
        description: "Study between 5 AM and 8 AM",
        icon: "🌅",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::ComebackKid,
        label: "Comeback Kid",
        description: "Retake a quiz on a topic",
        icon: "💪",
        category: BadgeCategory::Quiz,
    },
    Badge {
        id: BadgeId::FlashcardMaster,
        label: "Flashcard Master",
        description: "Complete 10 flashcard sessions",
        icon: "🃏",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::ChallengeChampion,
        label: "Challenge Champion",
        description: "Complete 30 daily challenges",
        icon: "⚔️",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::AllRounder,
        label: "All Rounder",
        description: "Complete 5 topics",
        icon: "🌍",
        category: BadgeCategory::General,
    },
    Badge {
        id: BadgeId::RocketStart,
        label: "Rocket Start",
        description: "Earn 100 XP on your first day",
        icon: "🚀",
        category: BadgeCategory::General,
    },
];

impl Badge {
    /// Badge definition by ID
    pub fn get(id: BadgeId) -> &'static Badge {
        BADGES
            .iter()
            .find(|b| b.id == id)
            .unwrap_or(&BADGES[0])
    }

    pub fn total_count() -> usize {
        BADGES.len()
    }
}
