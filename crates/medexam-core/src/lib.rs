//! medexam-core — Domain model, workflows, and scoring.
//!
//! This crate defines the data model, the question review state machine,
//! the attempt session logic, and the analytics aggregation that the rest
//! of the medexam system builds on. Everything here is persistence-free:
//! the HTTP and storage layers feed rows in and ship results out.

pub mod analytics;
pub mod attempt;
pub mod error;
pub mod generation;
pub mod model;
pub mod review;
