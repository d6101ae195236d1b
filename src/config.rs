//! Модуль конфигурации библиотеки narration-studio
//!
//! Этот модуль содержит структуры и перечисления для настройки синтеза,
//! кэша, истории правок и воспроизведения.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{Result, StudioError};

/// Язык текста для синтеза и выравнивания
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Корейский
    Ko,
    /// Английский
    En,
    /// Испанский
    Es,
    /// Португальский
    Pt,
    /// Французский
    Fr,
}

impl Default for Language {
    fn default() -> Self {
        Self::Ko
    }
}

impl Language {
    /// Получить код языка
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
            Self::Es => "es",
            Self::Pt => "pt",
            Self::Fr => "fr",
        }
    }

    /// Разобрать код языка
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            "pt" => Some(Self::Pt),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }
}

/// Модель TTS для использования с OpenAI API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsModel {
    /// Стандартная модель
    Standard,
    /// Модель высокого качества
    HighDefinition,
}

impl Default for TtsModel {
    fn default() -> Self {
        Self::Standard
    }
}

impl TtsModel {
    /// Получить строковое представление модели
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "tts-1",
            Self::HighDefinition => "tts-1-hd",
        }
    }

    /// Модель для заданного уровня качества
    pub fn for_quality(quality: u8) -> Self {
        if quality >= 8 {
            Self::HighDefinition
        } else {
            Self::Standard
        }
    }
}

/// Настройки доступа к OpenAI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API ключ для OpenAI
    pub api_key: String,
    /// Базовый адрес API
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Конфигурация сессии
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Язык текста
    pub language: Language,
    /// Идентификатор голоса движка
    pub voice: String,
    /// Скорость речи при синтезе
    pub speed: f32,
    /// Уровень качества синтеза (число шагов)
    pub quality: u8,
    /// Папка для результатов; по умолчанию папка сценария
    pub output_folder: Option<PathBuf>,
    /// Глубина истории правок для каждого режима
    pub history_depth: usize,
    /// Ёмкость кэша декодированного аудио
    pub cache_capacity: usize,
    /// Пауза между клипами при последовательном воспроизведении (мс)
    pub inter_clip_gap_ms: u64,
    /// Начальная скорость последовательного воспроизведения
    pub default_playback_speed: f32,
    /// Настройки OpenAI
    pub openai: OpenAiSettings,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            voice: "F1".to_string(),
            speed: 1.0,
            quality: 5,
            output_folder: None,
            history_depth: 20,
            cache_capacity: 10,
            inter_clip_gap_ms: 500,
            default_playback_speed: 1.0,
            openai: OpenAiSettings::default(),
        }
    }
}

impl StudioConfig {
    /// Загрузить конфигурацию из JSON файла
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: StudioConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Сохранить конфигурацию в JSON файл
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Подставить значения из переменных окружения
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.openai.api_key = key;
            }
        }
        self
    }

    /// Проверить корректность значений
    pub fn validate(&self) -> Result<()> {
        if self.history_depth == 0 {
            return Err(StudioError::Configuration("history_depth must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(StudioError::Configuration("cache_capacity must be at least 1".to_string()));
        }
        if !(0.25..=4.0).contains(&self.speed) {
            return Err(StudioError::Configuration(format!(
                "speed {} is outside 0.25..=4.0",
                self.speed
            )));
        }
        if self.quality == 0 {
            return Err(StudioError::Configuration("quality must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Пауза между клипами
    pub fn inter_clip_gap(&self) -> Duration {
        Duration::from_millis(self.inter_clip_gap_ms)
    }
}
