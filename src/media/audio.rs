//! Модуль для работы с аудио
//!
//! Загрузка аудиофайлов для воспроизведения и определение их длительности.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use bytes::Bytes;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use crate::error::{Result, StudioError};
use crate::services::AudioLoader;

/// Аудио, готовое к воспроизведению
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    /// Файл, из которого загружено аудио
    pub source: PathBuf,
    /// Содержимое файла
    pub bytes: Bytes,
    /// Длительность в секундах, если удалось определить
    pub duration: Option<f64>,
}

impl AudioPayload {
    pub fn new(source: impl Into<PathBuf>, bytes: impl Into<Bytes>, duration: Option<f64>) -> Self {
        Self {
            source: source.into(),
            bytes: bytes.into(),
            duration,
        }
    }
}

/// Определить длительность аудио по контейнеру
fn probe_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<Option<f64>> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| StudioError::InvalidFormat(format!("unrecognised audio: {}", e)))?;

    let duration = probed.format.default_track().and_then(|track| {
        let params = &track.codec_params;
        match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
            _ => None,
        }
    });
    Ok(duration)
}

/// Получение длительности аудиофайла в секундах
pub fn probe_duration(path: &Path) -> Result<Option<f64>> {
    let file = std::fs::File::open(path)?;
    probe_source(Box::new(file), path.extension().and_then(|e| e.to_str()))
}

/// Получение длительности аудио из памяти
pub fn probe_duration_bytes(bytes: &Bytes, extension: Option<&str>) -> Result<Option<f64>> {
    probe_source(Box::new(Cursor::new(bytes.clone())), extension)
}

/// Загрузчик аудио с локального диска
#[derive(Debug, Clone, Default)]
pub struct FileAudioLoader;

#[async_trait]
impl AudioLoader for FileAudioLoader {
    async fn load_audio(&self, path: &Path) -> Result<AudioPayload> {
        let bytes = Bytes::from(tokio::fs::read(path).await.map_err(|e| {
            StudioError::collaborator("load audio", format!("{}: {}", path.display(), e))
        })?);

        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_string);
        let probe_bytes = bytes.clone();
        let duration = tokio::task::spawn_blocking(move || probe_duration_bytes(&probe_bytes, extension.as_deref()))
            .await
            .map_err(|e| StudioError::Other(format!("duration probe task failed: {}", e)))?
            .unwrap_or_else(|e| {
                log::warn!("Could not read duration of {}: {}", path.display(), e);
                None
            });

        log::debug!("Loaded {} bytes of audio from {}", bytes.len(), path.display());
        Ok(AudioPayload::new(path, bytes, duration))
    }
}
