//! Вспомогательные модули: логирование и запуск FFmpeg

pub mod ffmpeg;
pub mod logger;

pub use logger::init_logger;
