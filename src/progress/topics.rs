//! Curriculum topics and per-student topic progress

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::domain::{Difficulty, NewTopic, StudentId, Topic, TopicId, TopicProgress, Track};

fn topic_from_row(r: &Row<'_>) -> rusqlite::Result<Option<Topic>> {
    let Some(track) = Track::from_str(&r.get::<_, String>(1)?) else {
        return Ok(None);
    };
    Ok(Some(Topic {
        id: r.get(0)?,
        track,
        order_num: r.get(2)?,
        title: r.get(3)?,
        description: r.get(4)?,
        difficulty: Difficulty::from_str(&r.get::<_, String>(5)?).unwrap_or_default(),
        read_time: r.get(6)?,
    }))
}

fn progress_from_row(r: &Row<'_>) -> rusqlite::Result<TopicProgress> {
    Ok(TopicProgress {
        student_id: r.get(0)?,
        topic_id: r.get(1)?,
        completed: r.get::<_, i32>(2)? != 0,
        completed_at: r.get(3)?,
        best_quiz_score: r.get(4)?,
        quiz_attempts: r.get(5)?,
    })
}

pub struct TopicStore;

impl TopicStore {
    /// Insert or update a topic keyed by (track, order_num)
    pub fn upsert(conn: &Connection, topic: &NewTopic) -> Result<TopicId> {
        conn.execute(
            r#"INSERT INTO topics (track, order_num, title, description, difficulty, read_time)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(track, order_num) DO UPDATE SET
                   title = excluded.title, description = excluded.description,
                   difficulty = excluded.difficulty, read_time = excluded.read_time"#,
            rusqlite::params![
                topic.track.as_str(),
                topic.order_num,
                topic.title,
                topic.description,
                topic.difficulty.as_str(),
                topic.read_time,
            ],
        )?;
        let id = conn.query_row(
            "SELECT id FROM topics WHERE track = ?1 AND order_num = ?2",
            rusqlite::params![topic.track.as_str(), topic.order_num],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn get(conn: &Connection, id: TopicId) -> Result<Option<Topic>> {
        let topic = conn
            .query_row(
                r#"SELECT id, track, order_num, title, description, difficulty, read_time
                   FROM topics WHERE id = ?1"#,
                [id],
                topic_from_row,
            )
            .optional()?;
        Ok(topic.flatten())
    }

    /// Topics of a track in curriculum order
    pub fn list_by_track(conn: &Connection, track: Track) -> Result<Vec<Topic>> {
        let mut stmt = conn.prepare(
            r#"SELECT id, track, order_num, title, description, difficulty, read_time
               FROM topics WHERE track = ?1 ORDER BY order_num"#,
        )?;
        let topics = stmt
            .query_map([track.as_str()], topic_from_row)?
            .filter_map(|r| r.ok().flatten())
            .collect();
        Ok(topics)
    }

    pub fn count_by_track(conn: &Connection, track: Track) -> Result<u32> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM topics WHERE track = ?1",
            [track.as_str()],
            |r| r.get(0),
        )?)
    }

    pub fn progress(conn: &Connection, student_id: StudentId, topic_id: TopicId) -> Result<Option<TopicProgress>> {
        let row = conn
            .query_row(
                r#"SELECT student_id, topic_id, completed, completed_at, best_quiz_score, quiz_attempts
                   FROM topic_progress WHERE student_id = ?1 AND topic_id = ?2"#,
                [student_id, topic_id],
                progress_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn progress_for_student(conn: &Connection, student_id: StudentId) -> Result<Vec<TopicProgress>> {
        let mut stmt = conn.prepare(
            r#"SELECT student_id, topic_id, completed, completed_at, best_quiz_score, quiz_attempts
               FROM topic_progress WHERE student_id = ?1 ORDER BY topic_id"#,
        )?;
        let rows = stmt
            .query_map([student_id], progress_from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Flip `completed` to true. Returns false if it already was.
    pub fn mark_completed(conn: &Connection, student_id: StudentId, topic_id: TopicId, at: i64) -> Result<bool> {
        let changed = conn.execute(
            r#"INSERT INTO topic_progress (student_id, topic_id, completed, completed_at)
               VALUES (?1, ?2, 1, ?3)
               ON CONFLICT(student_id, topic_id) DO UPDATE SET completed = 1, completed_at = ?3
               WHERE completed = 0"#,
            rusqlite::params![student_id, topic_id, at],
        )?;
        Ok(changed > 0)
    }

    /// Count a scored attempt and keep the best score
    pub fn record_quiz_score(conn: &Connection, student_id: StudentId, topic_id: TopicId, score: f64) -> Result<()> {
        conn.execute(
            r#"INSERT INTO topic_progress (student_id, topic_id, best_quiz_score, quiz_attempts)
               VALUES (?1, ?2, ?3, 1)
               ON CONFLICT(student_id, topic_id) DO UPDATE SET
                   quiz_attempts = quiz_attempts + 1,
                   best_quiz_score = MAX(COALESCE(best_quiz_score, 0), ?3)"#,
            rusqlite::params![student_id, topic_id, score],
        )?;
        Ok(())
    }
}
