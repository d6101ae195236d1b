//! Модуль синтеза речи
//!
//! Движок OpenAI TTS и координатор последовательного синтеза клипов.

pub mod coordinator;
pub mod openai;

pub use coordinator::{
    NarrationAccess, StopHandle, SynthesisCoordinator, SynthesisOutcome, SynthesisReport, SynthesisRunStatus,
    SynthesisSettings,
};
pub use openai::OpenAiSynthesizer;
