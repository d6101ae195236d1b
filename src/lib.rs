//! Основной файл библиотеки narration-studio
//!
//! Движок редактирования и воспроизведения озвучки по предложениям:
//! сценарий режется на клипы, каждый клип синтезируется внешним движком
//! TTS, клипы можно разделять, сливать, править и прослушивать по одному
//! или подряд. Параллельный режим субтитров выравнивает строки по аудио и
//! экспортирует проект с таймкодами.
//!
//! Точка входа - [`Session`]: все действия пользователя приходят в неё как
//! [`StudioCommand`], долгие операции (синтез, склейка, выравнивание,
//! экспорт) вызываются отдельными асинхронными методами.

pub mod clip;
pub mod commands;
pub mod config;
pub mod edit;
pub mod error;
pub mod history;
pub mod input;
pub mod media;
pub mod notification;
pub mod playback;
pub mod progress;
pub mod script;
pub mod services;
pub mod session;
pub mod subtitle;
pub mod tts;
pub mod utils;

pub use clip::{Clip, ClipId, ClipStatus};
pub use commands::{CommandOutcome, InputSource, StudioCommand, Workflow};
pub use config::StudioConfig;
pub use edit::{EditFocus, EditTarget};
pub use error::{Result, StudioError};
pub use playback::{AudioOutput, PlayerState, Stream};
pub use session::{Collaborators, Session};
