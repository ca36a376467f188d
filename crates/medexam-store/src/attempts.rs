//! Attempt and attempt-item persistence, plus the joined reads the
//! analytics aggregator consumes.

use rusqlite::{params, params_from_iter, OptionalExtension};

use medexam_core::analytics::AnsweredItem;
use medexam_core::attempt::AttemptTotals;
use medexam_core::error::{CoreError, CoreResult};
use medexam_core::model::{Attempt, AttemptItem, AttemptMode};

use crate::{internal, new_id, now_rfc3339, parse_col, parse_ts, Store};

const ATTEMPT_COLUMNS: &str = "id, user_id, exam_id, mode, started_at, completed_at, \
     total_questions, correct_count, time_spent_seconds";

fn map_attempt(row: &rusqlite::Row<'_>) -> rusqlite::Result<Attempt> {
    let completed_raw: Option<String> = row.get(5)?;
    Ok(Attempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exam_id: row.get(2)?,
        mode: parse_col(3, row.get(3)?)?,
        started_at: parse_ts(4, row.get(4)?)?,
        completed_at: completed_raw.map(|raw| parse_ts(5, raw)).transpose()?,
        total_questions: row.get(6)?,
        correct_count: row.get(7)?,
        time_spent_seconds: row.get(8)?,
    })
}

fn map_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttemptItem> {
    Ok(AttemptItem {
        id: row.get(0)?,
        attempt_id: row.get(1)?,
        question_id: row.get(2)?,
        user_answer: row.get(3)?,
        is_correct: row.get(4)?,
        time_spent_seconds: row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
    })
}

impl Store {
    pub fn create_attempt(
        &self,
        user_id: &str,
        exam_id: &str,
        mode: AttemptMode,
        total_questions: i64,
    ) -> CoreResult<Attempt> {
        let conn = self.conn()?;
        let id = new_id();
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO attempts (id, user_id, exam_id, mode, started_at, completed_at, \
             total_questions, correct_count, time_spent_seconds) \
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, 0, 0)",
            params![id, user_id, exam_id, mode.to_string(), now, total_questions],
        )
        .map_err(internal("inserting attempt"))?;
        drop(conn);
        self.get_attempt(&id)?.ok_or(CoreError::NotFound("attempt"))
    }

    pub fn get_attempt(&self, id: &str) -> CoreResult<Option<Attempt>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = ?1"),
            params![id],
            map_attempt,
        )
        .optional()
        .map_err(internal("loading attempt"))
    }

    /// Append an answered item. Resubmissions of the same question append
    /// again; nothing here deduplicates.
    pub fn insert_item(
        &self,
        attempt_id: &str,
        question_id: &str,
        user_answer: &str,
        is_correct: bool,
        time_spent_seconds: i64,
    ) -> CoreResult<AttemptItem> {
        let conn = self.conn()?;
        let id = new_id();
        let now = now_rfc3339();
        conn.execute(
            "INSERT INTO attempt_items (id, attempt_id, question_id, user_answer, is_correct, \
             time_spent_seconds, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                attempt_id,
                question_id,
                user_answer,
                is_correct,
                time_spent_seconds,
                now
            ],
        )
        .map_err(internal("inserting attempt item"))?;
        Ok(AttemptItem {
            id,
            attempt_id: attempt_id.into(),
            question_id: question_id.into(),
            user_answer: user_answer.into(),
            is_correct,
            time_spent_seconds,
            created_at: chrono::Utc::now(),
        })
    }

    pub fn items_for_attempt(&self, attempt_id: &str) -> CoreResult<Vec<AttemptItem>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, attempt_id, question_id, user_answer, is_correct, \
                 time_spent_seconds, created_at FROM attempt_items \
                 WHERE attempt_id = ?1 ORDER BY created_at",
            )
            .map_err(internal("preparing item query"))?;
        let rows = stmt
            .query_map(params![attempt_id], map_item)
            .map_err(internal("querying attempt items"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping attempt items"))
    }

    /// Overwrite the denormalized aggregates with freshly recomputed totals.
    pub fn update_aggregates(&self, attempt_id: &str, totals: &AttemptTotals) -> CoreResult<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE attempts SET correct_count = ?1, time_spent_seconds = ?2 WHERE id = ?3",
                params![totals.correct, totals.time_spent_seconds, attempt_id],
            )
            .map_err(internal("updating attempt aggregates"))?;
        if changed == 0 {
            return Err(CoreError::NotFound("attempt"));
        }
        Ok(())
    }

    /// Mark an attempt completed and fix its final totals. A no-op on an
    /// already-completed attempt keeps completion idempotent.
    pub fn finalize_attempt(&self, attempt_id: &str, totals: &AttemptTotals) -> CoreResult<Attempt> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE attempts SET completed_at = ?1, total_questions = ?2, correct_count = ?3, \
             time_spent_seconds = ?4 WHERE id = ?5 AND completed_at IS NULL",
            params![
                now_rfc3339(),
                totals.total,
                totals.correct,
                totals.time_spent_seconds,
                attempt_id
            ],
        )
        .map_err(internal("finalizing attempt"))?;
        drop(conn);
        self.get_attempt(attempt_id)?
            .ok_or(CoreError::NotFound("attempt"))
    }

    /// A user's attempts, newest first.
    pub fn list_attempts_for_user(&self, user_id: &str) -> CoreResult<Vec<Attempt>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE user_id = ?1 \
                 ORDER BY started_at DESC"
            ))
            .map_err(internal("preparing attempt listing"))?;
        let rows = stmt
            .query_map(params![user_id], map_attempt)
            .map_err(internal("querying attempts"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping attempts"))
    }

    /// Ids of the user's completed attempts, optionally scoped to one exam.
    pub fn completed_attempt_ids(
        &self,
        user_id: &str,
        exam_id: Option<&str>,
    ) -> CoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut sql =
            "SELECT id FROM attempts WHERE user_id = ?1 AND completed_at IS NOT NULL".to_string();
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
        if let Some(exam) = &exam_id {
            sql.push_str(" AND exam_id = ?2");
            params_vec.push(exam);
        }
        let mut stmt = conn.prepare(&sql).map_err(internal("preparing id query"))?;
        let rows = stmt
            .query_map(params_vec.as_slice(), |row| row.get::<_, String>(0))
            .map_err(internal("querying completed attempts"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping attempt ids"))
    }

    /// Items of the given attempts joined with question topic and difficulty
    /// metadata. Questions deleted since (or topics removed) surface as NULLs
    /// and land in the aggregator's "Unknown" bucket.
    pub fn answered_items(&self, attempt_ids: &[String]) -> CoreResult<Vec<AnsweredItem>> {
        if attempt_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let placeholders: Vec<String> = (1..=attempt_ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT q.topic_id, t.name, q.difficulty_level, ai.is_correct \
             FROM attempt_items ai \
             LEFT JOIN questions q ON q.id = ai.question_id \
             LEFT JOIN topics t ON t.id = q.topic_id \
             WHERE ai.attempt_id IN ({})",
            placeholders.join(", ")
        );
        let mut stmt = conn.prepare(&sql).map_err(internal("preparing join"))?;
        let rows = stmt
            .query_map(params_from_iter(attempt_ids.iter()), |row| {
                Ok(AnsweredItem {
                    topic_id: row.get(0)?,
                    topic_name: row.get(1)?,
                    difficulty_level: row.get(2)?,
                    is_correct: row.get(3)?,
                })
            })
            .map_err(internal("querying answered items"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping answered items"))
    }
}
