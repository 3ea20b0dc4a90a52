//! mien-core - Emotion journal store and aggregation.
//!
//! Persists emotion observations to an append-only JSON log with
//! atomic-replace writes, and turns the log into per-day summaries.
//! Also hosts the guided-breathing schedules and the affirmation table.

pub mod affirmations;
pub mod breathing;
pub mod journal;
pub mod record;
pub mod table;

pub use journal::{EmotionJournal, JournalError, LoadSource, Loaded};
pub use record::EmotionRecord;
pub use table::{DailySummary, RangeError, Row};
