//! Question persistence: CRUD over question rows and their status field.

use rusqlite::{params, OptionalExtension};

use medexam_core::error::{CoreError, CoreResult};
use medexam_core::model::{AnswerOption, Question, QuestionStatus, SourceType};
use medexam_core::review::ReviewUpdate;

use crate::{internal, new_id, now_rfc3339, parse_col, parse_json_opt, parse_ts, Store};

/// A question about to be inserted (AI draft or manually authored).
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub exam_id: String,
    pub topic_id: Option<String>,
    pub stem: String,
    pub options: Vec<AnswerOption>,
    pub correct_answer: String,
    pub difficulty_level: Option<String>,
    pub per_option_explanations: Option<serde_json::Value>,
    pub status: QuestionStatus,
    pub source_type: SourceType,
    pub created_by: String,
}

/// Filters for the paginated question listing.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub exam_id: Option<String>,
    pub status: Option<QuestionStatus>,
}

const QUESTION_COLUMNS: &str = "id, exam_id, topic_id, stem, options, correct_answer, \
     difficulty_level, per_option_explanations, status, reviewed_by, source_type, \
     created_by, created_at, updated_at";

fn map_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    let options_raw: String = row.get(4)?;
    let options: Vec<AnswerOption> = serde_json::from_str(&options_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Question {
        id: row.get(0)?,
        exam_id: row.get(1)?,
        topic_id: row.get(2)?,
        stem: row.get(3)?,
        options,
        correct_answer: row.get(5)?,
        difficulty_level: row.get(6)?,
        per_option_explanations: parse_json_opt(7, row.get(7)?)?,
        status: parse_col(8, row.get(8)?)?,
        reviewed_by: row.get(9)?,
        source_type: parse_col(10, row.get(10)?)?,
        created_by: row.get(11)?,
        created_at: parse_ts(12, row.get(12)?)?,
        updated_at: parse_ts(13, row.get(13)?)?,
    })
}

impl Store {
    pub fn insert_question(&self, new: NewQuestion) -> CoreResult<Question> {
        let conn = self.conn()?;
        let id = new_id();
        let now = now_rfc3339();
        let options = serde_json::to_string(&new.options)
            .map_err(internal("serializing question options"))?;
        let explanations = new
            .per_option_explanations
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(internal("serializing explanations"))?;
        conn.execute(
            "INSERT INTO questions (id, exam_id, topic_id, stem, options, correct_answer, \
             difficulty_level, per_option_explanations, status, reviewed_by, source_type, \
             created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?11, ?12, ?12)",
            params![
                id,
                new.exam_id,
                new.topic_id,
                new.stem,
                options,
                new.correct_answer,
                new.difficulty_level,
                explanations,
                new.status.to_string(),
                new.source_type.to_string(),
                new.created_by,
                now,
            ],
        )
        .map_err(internal("inserting question"))?;
        drop(conn);
        self.get_question(&id)?
            .ok_or(CoreError::NotFound("question"))
    }

    pub fn get_question(&self, id: &str) -> CoreResult<Option<Question>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
            params![id],
            map_question,
        )
        .optional()
        .map_err(internal("loading question"))
    }

    /// Persist the outcome of a review action. Last write wins on
    /// concurrent verdicts; both end up in the review log.
    pub fn apply_review_update(&self, question_id: &str, update: &ReviewUpdate) -> CoreResult<()> {
        let conn = self.conn()?;
        let now = now_rfc3339();
        let explanations = update
            .per_option_explanations
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(internal("serializing explanations"))?;
        let changed = match &explanations {
            Some(expl) => conn
                .execute(
                    "UPDATE questions SET status = ?1, reviewed_by = ?2, \
                     per_option_explanations = ?3, updated_at = ?4 WHERE id = ?5",
                    params![
                        update.status.to_string(),
                        update.reviewed_by,
                        expl,
                        now,
                        question_id
                    ],
                )
                .map_err(internal("updating question review state"))?,
            None => conn
                .execute(
                    "UPDATE questions SET status = ?1, reviewed_by = ?2, updated_at = ?3 \
                     WHERE id = ?4",
                    params![update.status.to_string(), update.reviewed_by, now, question_id],
                )
                .map_err(internal("updating question review state"))?,
        };
        if changed == 0 {
            return Err(CoreError::NotFound("question"));
        }
        Ok(())
    }

    /// All published questions for an exam, optionally filtered to topics.
    /// The only query attempt creation is allowed to see.
    pub fn published_questions(
        &self,
        exam_id: &str,
        topic_ids: &[String],
    ) -> CoreResult<Vec<Question>> {
        let conn = self.conn()?;
        let mut sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = ?1 AND status = 'published'"
        );
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = vec![&exam_id];
        if !topic_ids.is_empty() {
            let placeholders: Vec<String> = (0..topic_ids.len())
                .map(|i| format!("?{}", i + 2))
                .collect();
            sql.push_str(&format!(" AND topic_id IN ({})", placeholders.join(", ")));
            for id in topic_ids {
                params_vec.push(id);
            }
        }
        let mut stmt = conn.prepare(&sql).map_err(internal("preparing query"))?;
        let rows = stmt
            .query_map(params_vec.as_slice(), map_question)
            .map_err(internal("querying published questions"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping question rows"))
    }

    /// Paginated listing, newest first. Returns the page plus the total
    /// matching count.
    pub fn list_questions(
        &self,
        filter: &QuestionFilter,
        page: u32,
        page_size: u32,
    ) -> CoreResult<(Vec<Question>, i64)> {
        let conn = self.conn()?;
        let mut where_clauses = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(exam_id) = &filter.exam_id {
            params_vec.push(Box::new(exam_id.clone()));
            where_clauses.push(format!("exam_id = ?{}", params_vec.len()));
        }
        if let Some(status) = &filter.status {
            params_vec.push(Box::new(status.to_string()));
            where_clauses.push(format!("status = ?{}", params_vec.len()));
        }
        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_clauses.join(" AND "))
        };

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM questions{where_sql}"),
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                |row| row.get(0),
            )
            .map_err(internal("counting questions"))?;

        let offset = (page.max(1) - 1) * page_size;
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions{where_sql} \
             ORDER BY created_at DESC LIMIT {page_size} OFFSET {offset}"
        );
        let mut stmt = conn.prepare(&sql).map_err(internal("preparing listing"))?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                map_question,
            )
            .map_err(internal("querying questions"))?;
        let questions = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(internal("mapping question rows"))?;
        Ok((questions, total))
    }

    /// Force a status directly; seeding/test helper, not a review path.
    pub fn set_question_status(&self, id: &str, status: QuestionStatus) -> CoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE questions SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.to_string(), now_rfc3339(), id],
        )
        .map_err(internal("setting question status"))?;
        Ok(())
    }
}
