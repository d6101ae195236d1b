//! Модуль обработки ошибок библиотеки narration-studio
//!
//! Ошибки делятся на ошибки пользовательского ввода (ничего не меняется в
//! состоянии), сбои внешних сервисов (синтез, выравнивание, склейка, экспорт)
//! и технические ошибки ввода-вывода. Отмена операции ошибкой не считается.

use thiserror::Error;

/// Ошибки библиотеки narration-studio
#[derive(Debug, Error)]
pub enum StudioError {
    /// Некорректный ввод пользователя: пустой файл, неподдерживаемый формат,
    /// пустая часть при разделении клипа, отсутствующий файл для выравнивания
    #[error("{0}")]
    UserInput(String),

    /// Внешний сервис вернул ошибку
    #[error("{operation} failed: {message}")]
    Collaborator {
        /// Название операции (synthesize, align, merge, export, load audio)
        operation: &'static str,
        /// Сообщение сервиса
        message: String,
    },

    /// Длительная операция уже выполняется
    #[error("Operation already running: {0}")]
    Busy(String),

    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка чтения DOCX архива
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Неверный формат
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl StudioError {
    /// Ошибка внешнего сервиса
    pub fn collaborator(operation: &'static str, message: impl Into<String>) -> Self {
        StudioError::Collaborator {
            operation,
            message: message.into(),
        }
    }

    /// Ошибка пользовательского ввода
    pub fn user_input(message: impl Into<String>) -> Self {
        StudioError::UserInput(message.into())
    }

    /// Нужно ли показать ошибку пользователю как блокирующее сообщение
    pub fn is_user_facing(&self) -> bool {
        matches!(self, StudioError::UserInput(_) | StudioError::Busy(_))
    }
}

impl From<&str> for StudioError {
    fn from(s: &str) -> Self {
        StudioError::Other(s.to_string())
    }
}

impl From<String> for StudioError {
    fn from(s: String) -> Self {
        StudioError::Other(s)
    }
}

/// Тип Result для библиотеки narration-studio
pub type Result<T> = std::result::Result<T, StudioError>;
