//! Модуль клипов озвучки
//!
//! Клип - это предложение сценария вместе со ссылкой на синтезированный
//! аудиофайл. Идентификатор клипа создаётся один раз и никогда не
//! переиспользуется: разделение и слияние всегда порождают новые клипы.

mod store;

pub use store::ClipStore;

use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Стабильный идентификатор клипа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Создать новый идентификатор
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Короткая форма для имён файлов
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Состояние синтеза клипа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipStatus {
    /// Ещё не синтезирован
    Pending,
    /// Синтез выполняется
    InProgress,
    /// Аудио готово и соответствует тексту
    Done,
    /// Последний синтез завершился ошибкой
    Failed,
    /// Текст изменён после успешного синтеза
    Edited,
}

impl ClipStatus {
    /// Подпись для интерфейса
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Edited => "edited",
        }
    }
}

/// Клип озвучки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Идентификатор клипа
    pub id: ClipId,
    /// Текст клипа
    pub text: String,
    /// Путь к синтезированному аудио
    pub audio: Option<PathBuf>,
    /// Длительность аудио в секундах
    pub duration: Option<f64>,
    /// Состояние синтеза
    pub status: ClipStatus,
    /// Был ли у клипа хотя бы один успешный синтез
    #[serde(default)]
    pub synthesized: bool,
}

impl Clip {
    /// Создать новый клип с новым идентификатором
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ClipId::new(),
            text: text.into(),
            audio: None,
            duration: None,
            status: ClipStatus::Pending,
            synthesized: false,
        }
    }

    /// Есть ли у клипа синтезированное аудио
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Сбросить аудио после изменения текста. Клип, у которого уже был
    /// успешный синтез, становится `Edited` независимо от текущего статуса.
    pub(crate) fn clear_audio(&mut self) {
        let had_synthesis = self.synthesized
            || self.audio.is_some()
            || matches!(self.status, ClipStatus::Done | ClipStatus::Edited);
        self.audio = None;
        self.duration = None;
        self.status = if had_synthesis { ClipStatus::Edited } else { ClipStatus::Pending };
    }

    /// Привести состояние к согласованному виду после восстановления из истории
    pub(crate) fn settle_status(&mut self) {
        if self.status == ClipStatus::InProgress {
            self.status = if self.audio.is_some() {
                ClipStatus::Done
            } else if self.synthesized {
                ClipStatus::Edited
            } else {
                ClipStatus::Pending
            };
        }
    }

    /// Длина текста в символах
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
