//! Модуль для работы с медиафайлами
//!
//! Загрузка аудио для воспроизведения, LRU кэш и склейка файлов.

pub mod audio;
pub mod cache;
pub mod merge;

pub use audio::{AudioPayload, FileAudioLoader};
pub use cache::AudioCache;
pub use merge::FfmpegMerger;
