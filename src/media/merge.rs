//! Склейка аудиофайлов клипов в один файл через FFmpeg

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use crate::error::{Result, StudioError};
use crate::services::AudioMerger;
use crate::utils::ffmpeg::{check_ffmpeg_installed, run_ffmpeg_command};

/// Сформировать список файлов для concat demuxer
pub fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|file| {
            let escaped = file.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Склейка через FFmpeg concat demuxer
#[derive(Debug, Clone, Default)]
pub struct FfmpegMerger;

#[async_trait]
impl AudioMerger for FfmpegMerger {
    async fn merge_audio(&self, files: &[PathBuf], output_name: &str, output_folder: Option<&Path>) -> Result<PathBuf> {
        if files.is_empty() {
            return Err(StudioError::collaborator("merge", "no audio files to merge"));
        }
        if !check_ffmpeg_installed().await {
            return Err(StudioError::collaborator("merge", "ffmpeg is not installed"));
        }

        let folder = output_folder
            .map(Path::to_path_buf)
            .or_else(|| files[0].parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&folder).await?;
        let output_path = folder.join(format!("{}_merged.wav", output_name));

        // Создаем временный файл со списком входных файлов
        let temp_dir = tempfile::tempdir()?;
        let list_path = temp_dir.path().join("concat_list.txt");
        tokio::fs::write(&list_path, concat_list(files)).await?;

        let args: Vec<String> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.to_string_lossy().into_owned(),
            "-c:a".into(),
            "pcm_s16le".into(),
            "-y".into(),
            output_path.to_string_lossy().into_owned(),
        ];
        run_ffmpeg_command(&args).await?;

        log::info!("Merged {} clips into {}", files.len(), output_path.display());
        Ok(output_path)
    }
}
