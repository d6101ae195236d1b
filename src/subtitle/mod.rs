//! Модуль субтитров
//!
//! Строки субтитров, их таймкоды и экспорт в SRT.

pub mod lines;
pub mod srt;
pub mod timecode;

pub use lines::{SubtitleLine, SubtitleStore};
pub use timecode::{Timecode, TimecodeEdge, Timestamp};
