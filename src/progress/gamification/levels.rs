//! Level bands
//!
//! Total XP maps to one of six named bands. The last band is terminal.

use serde::Serialize;

/// Level definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub rank: u32,
    pub xp_required: u64,
    pub title: &'static str,
}

/// All level definitions (must be sorted by rank)
pub static LEVELS: &[Level] = &[
    Level {
        rank: 1,
        xp_required: 0,
        title: "Explorer",
    },
    Level {
        rank: 2,
        xp_required: 500,
        title: "Builder",
    },
    Level {
        rank: 3,
        xp_required: 1500,
        title: "Engineer",
    },
    Level {
        rank: 4,
        xp_required: 3000,
        title: "Scientist",
    },
    Level {
        rank: 5,
        xp_required: 5000,
        title: "Legend",
    },
    Level {
        rank: 6,
        xp_required: 10000,
        title: "Mastermind",
    },
];

impl Level {
    /// Band for the given XP total
    pub fn for_xp(xp: u64) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&LEVELS[0])
    }

    pub fn label(&self) -> &'static str {
        self.title
    }

    /// Next band, None in the terminal band
    pub fn next(&self) -> Option<&'static Level> {
        LEVELS.iter().find(|l| l.rank == self.rank + 1)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn from_label(label: &str) -> Option<&'static Level> {
        LEVELS.iter().find(|l| l.title == label)
    }
}

/// Position inside the current band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: &'static str,
    pub pct: f64,
    pub current_floor: u64,
    /// None in the terminal band
    pub next_ceiling: Option<u64>,
    pub next_level: Option<&'static str>,
}

impl LevelProgress {
    pub fn for_xp(xp: u64) -> Self {
        let level = Level::for_xp(xp);
        match level.next() {
            Some(next) => {
                let span = (next.xp_required - level.xp_required) as f64;
                let into = (xp - level.xp_required) as f64;
                Self {
                    level: level.title,
                    pct: (into / span * 100.0).clamp(0.0, 100.0),
                    current_floor: level.xp_required,
                    next_ceiling: Some(next.xp_required),
                    next_level: Some(next.title),
                }
            }
            None => Self {
                level: level.title,
                pct: 100.0,
                current_floor: level.xp_required,
                next_ceiling: None,
                next_level: None,
            },
        }
    }
}
