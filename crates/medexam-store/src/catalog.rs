//! Exam/topic catalog, question flags, the review audit log, and role
//! lookups.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension};

use medexam_core::error::{CoreError, CoreResult};
use medexam_core::model::{Exam, Flag, ReviewAction, ReviewLogEntry, Topic};

use crate::{internal, new_id, now_rfc3339, parse_col, parse_ts, Store};

/// An exam catalog entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub name: String,
    pub board: Option<String>,
    pub curriculum: Option<String>,
    pub format_prompt: Option<String>,
}

fn map_exam(row: &rusqlite::Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        name: row.get(1)?,
        board: row.get(2)?,
        curriculum: row.get(3)?,
        format_prompt: row.get(4)?,
        created_at: parse_ts(5, row.get(5)?)?,
    })
}

impl Store {
    pub fn insert_exam(&self, new: NewExam) -> CoreResult<Exam> {
        let conn = self.conn()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO exams (id, name, board, curriculum, format_prompt, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                new.name,
                new.board,
                new.curriculum,
                new.format_prompt,
                now_rfc3339()
            ],
        )
        .map_err(internal("inserting exam"))?;
        drop(conn);
        self.get_exam(&id)?.ok_or(CoreError::NotFound("exam"))
    }

    pub fn get_exam(&self, id: &str) -> CoreResult<Option<Exam>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, board, curriculum, format_prompt, created_at \
             FROM exams WHERE id = ?1",
            params![id],
            map_exam,
        )
        .optional()
        .map_err(internal("loading exam"))
    }

    pub fn list_exams(&self) -> CoreResult<Vec<Exam>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, board, curriculum, format_prompt, created_at \
                 FROM exams ORDER BY created_at DESC",
            )
            .map_err(internal("preparing exam listing"))?;
        let rows = stmt
            .query_map([], map_exam)
            .map_err(internal("querying exams"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping exams"))
    }

    pub fn insert_topic(&self, exam_id: &str, name: &str) -> CoreResult<Topic> {
        let conn = self.conn()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO topics (id, exam_id, name) VALUES (?1, ?2, ?3)",
            params![id, exam_id, name],
        )
        .map_err(internal("inserting topic"))?;
        Ok(Topic {
            id,
            exam_id: exam_id.into(),
            name: name.into(),
        })
    }

    pub fn topic_name(&self, id: &str) -> CoreResult<Option<String>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT name FROM topics WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(internal("loading topic name"))
    }

    /// Topics, optionally scoped to one exam, name order.
    pub fn list_topics(&self, exam_id: Option<&str>) -> CoreResult<Vec<Topic>> {
        let conn = self.conn()?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Topic> {
            Ok(Topic {
                id: row.get(0)?,
                exam_id: row.get(1)?,
                name: row.get(2)?,
            })
        };
        let topics = match exam_id {
            Some(exam) => {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, exam_id, name FROM topics WHERE exam_id = ?1 ORDER BY name",
                    )
                    .map_err(internal("preparing topic listing"))?;
                let rows = stmt
                    .query_map(params![exam], map)
                    .map_err(internal("querying topics"))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT id, exam_id, name FROM topics ORDER BY name")
                    .map_err(internal("preparing topic listing"))?;
                let rows = stmt
                    .query_map([], map)
                    .map_err(internal("querying topics"))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
        }
        .map_err(internal("mapping topics"))?;
        Ok(topics)
    }

    pub fn insert_flag(
        &self,
        question_id: &str,
        user_id: &str,
        reason: Option<&str>,
    ) -> CoreResult<Flag> {
        let conn = self.conn()?;
        let id = new_id();
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO flags (id, question_id, user_id, reason, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, question_id, user_id, reason, now],
        )
        .map_err(internal("inserting flag"))?;
        Ok(Flag {
            id,
            question_id: question_id.into(),
            user_id: user_id.into(),
            reason: reason.map(String::from),
            created_at: chrono::Utc::now(),
        })
    }

    /// Append one audit entry. The log is never updated or deleted from.
    pub fn append_review_log(
        &self,
        question_id: &str,
        reviewer_id: &str,
        action: ReviewAction,
        notes: Option<&str>,
    ) -> CoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO review_log (id, question_id, reviewer_id, action, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new_id(),
                question_id,
                reviewer_id,
                action.to_string(),
                notes,
                now_rfc3339()
            ],
        )
        .map_err(internal("appending review log"))?;
        Ok(())
    }

    /// Audit history for one question, oldest first.
    pub fn review_log_for_question(&self, question_id: &str) -> CoreResult<Vec<ReviewLogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, question_id, reviewer_id, action, notes, created_at \
                 FROM review_log WHERE question_id = ?1 ORDER BY created_at",
            )
            .map_err(internal("preparing review log query"))?;
        let rows = stmt
            .query_map(params![question_id], |row| {
                Ok(ReviewLogEntry {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    reviewer_id: row.get(2)?,
                    action: parse_col(3, row.get(3)?)?,
                    notes: row.get(4)?,
                    created_at: parse_ts(5, row.get(5)?)?,
                })
            })
            .map_err(internal("querying review log"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping review log"))
    }

    /// All roles held by a user, read fresh on every call.
    pub fn roles_for(&self, user_id: &str) -> CoreResult<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT role FROM user_roles WHERE user_id = ?1")
            .map_err(internal("preparing role query"))?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(internal("querying roles"))?;
        rows.collect::<rusqlite::Result<HashSet<_>>>()
            .map_err(internal("mapping roles"))
    }

    pub fn grant_role(&self, user_id: &str, role: &str) -> CoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
            params![user_id, role],
        )
        .map_err(internal("granting role"))?;
        Ok(())
    }
}
