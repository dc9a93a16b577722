//! Curriculum catalog loading
//!
//! A catalog is a TOML file with `[[students]]` and `[[topics]]` tables (see
//! `demo/catalog.toml`). Seeding upserts topics by (track, position) and
//! enrolls students whose names are not taken yet, so it can be re-run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Difficulty, NewStudent, NewTopic, Track};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::progress::TopicStore;

const DEFAULT_READ_TIME: u32 = 10;

/// Topic entry. Without `order_num` the topic goes after the previous
/// entry of the same track.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTopic {
    pub track: Track,
    #[serde(default)]
    pub order_num: Option<u32>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub read_time: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub students: Vec<NewStudent>,
    #[serde(default)]
    pub topics: Vec<CatalogTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub students_added: usize,
    pub students_skipped: usize,
    pub topics_upserted: usize,
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        content
            .parse::<Catalog>()
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))
    }

    /// Topics with positions filled in, checked for duplicates
    pub fn resolved_topics(&self) -> Result<Vec<NewTopic>> {
        let mut next: HashMap<Track, u32> = HashMap::new();
        let mut seen: HashMap<(Track, u32), &str> = HashMap::new();
        let mut topics = Vec::with_capacity(self.topics.len());

        for entry in &self.topics {
            if entry.title.trim().is_empty() {
                bail!("topic without a title in track {}", entry.track);
            }
            let counter = next.entry(entry.track).or_insert(1);
            let order_num = entry.order_num.unwrap_or(*counter);
            if order_num == 0 {
                bail!("topic \"{}\": order_num starts at 1", entry.title);
            }
            *counter = order_num + 1;

            if let Some(other) = seen.insert((entry.track, order_num), &entry.title) {
                bail!(
                    "topics \"{}\" and \"{}\" share position {} in track {}",
                    other,
                    entry.title,
                    order_num,
                    entry.track
                );
            }

            topics.push(NewTopic {
                track: entry.track,
                order_num,
                title: entry.title.trim().to_string(),
                description: entry.description.trim().to_string(),
                difficulty: entry.difficulty,
                read_time: entry.read_time.unwrap_or(DEFAULT_READ_TIME),
            });
        }
        Ok(topics)
    }

    pub fn seed(&self, engine: &Engine) -> Result<SeedReport> {
        let topics = self.resolved_topics()?;
        let mut report = SeedReport::default();

        report.topics_upserted = engine.db().write(|conn| {
            for topic in &topics {
                TopicStore::upsert(conn, topic)?;
            }
            Ok::<_, anyhow::Error>(topics.len())
        })?;

        for student in &self.students {
            match engine.enroll(student) {
                Ok(created) => {
                    debug!("[learnforge:catalog] enrolled {}", created.name);
                    report.students_added += 1;
                }
                Err(EngineError::Conflict(_)) => report.students_skipped += 1,
                Err(e) => {
                    return Err(anyhow::Error::new(e))
                        .with_context(|| format!("Failed to enroll {}", student.name));
                }
            }
        }

        info!(
            "[learnforge:catalog] {} topics, {} students added, {} already present",
            report.topics_upserted, report.students_added, report.students_skipped
        );
        Ok(report)
    }
}

impl std::str::FromStr for Catalog {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[students]]
name = "Aalam"
pin = "1313"
track = "gaming"
avatar = "🎮"

[[students]]
name = "Uncle"
pin = "0000"
role = "admin"

[[topics]]
track = "gaming"
title = "What is AI? Explained through game NPCs"
read_time = 8

[[topics]]
track = "gaming"
title = "How game enemies find you"
difficulty = "intermediate"

[[topics]]
track = "business"
order_num = 3
title = "AI in marketing"
"#;

    #[test]
    fn test_positions_are_assigned_per_track() {
        let catalog: Catalog = SAMPLE.parse().unwrap();
        assert_eq!(catalog.students.len(), 2);
        let topics = catalog.resolved_topics().unwrap();
        assert_eq!(topics[0].order_num, 1);
        assert_eq!(topics[0].read_time, 8);
        assert_eq!(topics[1].order_num, 2);
        assert_eq!(topics[1].difficulty, Difficulty::Intermediate);
        assert_eq!(topics[1].read_time, 10);
        assert_eq!(topics[2].order_num, 3);
    }

    #[test]
    fn test_duplicate_positions_are_rejected() {
        let catalog: Catalog = r#"
[[topics]]
track = "developer"
order_num = 2
title = "A"

[[topics]]
track = "developer"
order_num = 2
title = "B"
"#
        .parse()
        .unwrap();
        let err = catalog.resolved_topics().unwrap_err();
        assert!(err.to_string().contains("share position 2"));
    }

    #[test]
    fn test_unknown_track_fails_to_parse() {
        let result: Result<Catalog, _> = "[[topics]]\ntrack = \"cooking\"\ntitle = \"x\"\n".parse();
        assert!(result.is_err());
    }
}
