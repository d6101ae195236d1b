//! Внешние сервисы
//!
//! Синтез речи, выравнивание субтитров по аудио, склейка файлов, экспорт
//! проекта и загрузка аудио для воспроизведения. Сервисы медленные и могут
//! отказать; их ошибки приходят как `StudioError::Collaborator`.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use crate::config::Language;
use crate::error::Result;
use crate::media::AudioPayload;
use crate::subtitle::Timecode;

/// Запрос на синтез одного клипа
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Language,
    pub voice: String,
    pub speed: f32,
    pub quality: u8,
    /// Имя файла без расширения
    pub output_name: String,
    pub output_folder: Option<PathBuf>,
}

/// Результат успешного синтеза
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    pub path: PathBuf,
    pub duration: Option<f64>,
}

/// Движок синтеза речи
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput>;
}

/// Выравнивание строк субтитров по аудио; i-й таймкод относится к i-й строке
#[async_trait]
pub trait SpeechAligner: Send + Sync {
    async fn align_lines(&self, audio: &Path, lines: &[String], language: Language) -> Result<Vec<Timecode>>;
}

/// Склейка аудиофайлов в заданном порядке
#[async_trait]
pub trait AudioMerger: Send + Sync {
    async fn merge_audio(&self, files: &[PathBuf], output_name: &str, output_folder: Option<&Path>) -> Result<PathBuf>;
}

/// Экспорт проекта субтитров
#[async_trait]
pub trait ProjectExporter: Send + Sync {
    async fn export_project(
        &self,
        name: &str,
        audio: &Path,
        lines: &[String],
        timecodes: &[Timecode],
        output_folder: Option<&Path>,
    ) -> Result<PathBuf>;
}

/// Загрузка аудио для воспроизведения
#[async_trait]
pub trait AudioLoader: Send + Sync {
    async fn load_audio(&self, path: &Path) -> Result<AudioPayload>;
}

/// Файл, выбранный в диалоге
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub path: PathBuf,
    pub file_name: String,
    pub folder: PathBuf,
}

impl FileSelection {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self { path, file_name, folder }
    }

    /// Имя файла без расширения
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Диалог выбора файла; `None` означает отмену пользователем
#[async_trait]
pub trait FileDialog: Send + Sync {
    async fn pick_audio_file(&self) -> Result<Option<FileSelection>>;
}
