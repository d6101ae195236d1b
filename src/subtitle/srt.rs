//! Экспорт субтитров в формат SRT

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use crate::error::{Result, StudioError};
use crate::services::ProjectExporter;
use crate::subtitle::timecode::Timecode;

/// Сформировать текст SRT файла
pub fn render_srt(lines: &[String], timecodes: &[Timecode]) -> String {
    let mut out = String::new();
    for (i, (text, tc)) in lines.iter().zip(timecodes.iter()).enumerate() {
        out.push_str(&format!("{}\n{} --> {}\n{}\n\n", i + 1, tc.start, tc.end, text));
    }
    out
}

/// Экспорт проекта в виде SRT файла рядом с аудио
#[derive(Debug, Clone, Default)]
pub struct SrtExporter {
    /// Папка по умолчанию, если вызывающий не указал свою
    pub default_folder: Option<PathBuf>,
}

impl SrtExporter {
    pub fn new(default_folder: Option<PathBuf>) -> Self {
        Self { default_folder }
    }
}

#[async_trait]
impl ProjectExporter for SrtExporter {
    async fn export_project(
        &self,
        name: &str,
        audio: &Path,
        lines: &[String],
        timecodes: &[Timecode],
        output_folder: Option<&Path>,
    ) -> Result<PathBuf> {
        if lines.is_empty() || timecodes.is_empty() {
            return Err(StudioError::collaborator("export", "no subtitles or timecodes to export"));
        }

        let folder = output_folder
            .map(Path::to_path_buf)
            .or_else(|| self.default_folder.clone())
            .or_else(|| audio.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&folder).await?;

        let path = folder.join(format!("{}.srt", name));
        tokio::fs::write(&path, render_srt(lines, timecodes)).await?;
        log::info!("Saved SRT with {} entries to {}", lines.len(), path.display());
        Ok(path)
    }
}
