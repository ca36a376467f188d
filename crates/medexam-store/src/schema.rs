//! Schema bootstrap. Idempotent: every statement is `IF NOT EXISTS`.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exams (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    board         TEXT,
    curriculum    TEXT,
    format_prompt TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS topics (
    id      TEXT PRIMARY KEY,
    exam_id TEXT NOT NULL REFERENCES exams(id),
    name    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_topics_exam ON topics(exam_id);

CREATE TABLE IF NOT EXISTS questions (
    id                      TEXT PRIMARY KEY,
    exam_id                 TEXT NOT NULL REFERENCES exams(id),
    topic_id                TEXT REFERENCES topics(id),
    stem                    TEXT NOT NULL,
    options                 TEXT NOT NULL,
    correct_answer          TEXT NOT NULL,
    difficulty_level        TEXT,
    per_option_explanations TEXT,
    status                  TEXT NOT NULL DEFAULT 'draft',
    reviewed_by             TEXT,
    source_type             TEXT NOT NULL DEFAULT 'manual',
    created_by              TEXT NOT NULL,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questions_exam_status ON questions(exam_id, status);

CREATE TABLE IF NOT EXISTS review_log (
    id          TEXT PRIMARY KEY,
    question_id TEXT NOT NULL,
    reviewer_id TEXT NOT NULL,
    action      TEXT NOT NULL,
    notes       TEXT,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_log_question ON review_log(question_id);

CREATE TABLE IF NOT EXISTS attempts (
    id                 TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL,
    exam_id            TEXT NOT NULL REFERENCES exams(id),
    mode               TEXT NOT NULL,
    started_at         TEXT NOT NULL,
    completed_at       TEXT,
    total_questions    INTEGER NOT NULL DEFAULT 0,
    correct_count      INTEGER NOT NULL DEFAULT 0,
    time_spent_seconds INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_attempts_user ON attempts(user_id);

-- No UNIQUE(attempt_id, question_id): resubmitting a question appends a new
-- item and all items count toward the aggregates.
CREATE TABLE IF NOT EXISTS attempt_items (
    id                 TEXT PRIMARY KEY,
    attempt_id         TEXT NOT NULL REFERENCES attempts(id),
    question_id        TEXT NOT NULL,
    user_answer        TEXT NOT NULL,
    is_correct         INTEGER NOT NULL,
    time_spent_seconds INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attempt_items_attempt ON attempt_items(attempt_id);

CREATE TABLE IF NOT EXISTS flags (
    id          TEXT PRIMARY KEY,
    question_id TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    reason      TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL,
    role    TEXT NOT NULL,
    PRIMARY KEY (user_id, role)
);
"#;
