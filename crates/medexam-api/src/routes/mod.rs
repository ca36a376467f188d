//! HTTP handlers, one module per surface area.

pub mod analytics;
pub mod attempt;
pub mod catalog;
pub mod generate;
pub mod review;
