//! Analyzer module - maintainability audit engine

pub mod engine;
pub mod rules;
pub mod scoring;
pub mod tools;

pub use engine::Auditor;
pub use scoring::{weighted_score, ScoreCard};
pub use tools::{SystemRunner, ToolRunner};
