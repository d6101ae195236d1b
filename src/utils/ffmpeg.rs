//! Модуль для работы с FFmpeg
//!
//! Этот модуль содержит функции для запуска FFmpeg.

use std::process::Stdio;
use tokio::process::Command;
use crate::error::{Result, StudioError};

/// Проверка наличия FFmpeg
pub async fn check_ffmpeg_installed() -> bool {
    match Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            log::debug!("ffmpeg is not available: {}", e);
            false
        }
    }
}

/// Запуск команды FFmpeg; stderr попадает в текст ошибки
pub async fn run_ffmpeg_command(args: &[String]) -> Result<()> {
    log::debug!("Running ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| StudioError::collaborator("merge", format!("failed to start ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        return Err(StudioError::collaborator(
            "merge",
            format!(
                "ffmpeg exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            ),
        ));
    }

    Ok(())
}
