//! Наблюдатели прогресса
//!
//! Запись в лог, накопление в памяти (для тестов и интерфейса) и пересылка
//! через канал Tokio.

use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use crate::progress::{ProgressInfo, ProgressObserver};

/// Наблюдатель, пишущий прогресс в лог
#[derive(Debug, Clone, Default)]
pub struct LogProgressObserver {
    prefix: Option<String>,
}

impl LogProgressObserver {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match progress.details.as_deref() {
            Some(details) => log::info!(
                "{}[{}] {:.1}% ({:.1}% total): {}",
                prefix,
                progress.step,
                progress.step_progress,
                progress.total_progress,
                details
            ),
            None => log::info!(
                "{}[{}] {:.1}% ({:.1}% total)",
                prefix,
                progress.step,
                progress.step_progress,
                progress.total_progress
            ),
        }
    }
}

/// Наблюдатель, сохраняющий все обновления в памяти
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    /// Последнее сообщение, если было
    pub fn last_details(&self) -> Option<String> {
        self.history.lock().iter().rev().find_map(|info| info.details.clone())
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, пересылающий прогресс в канал. При переполнении канала
/// обновление отбрасывается: прогресс важен только последний.
pub struct ChannelProgressObserver {
    sender: mpsc::Sender<ProgressInfo>,
}

impl ChannelProgressObserver {
    pub fn new(sender: mpsc::Sender<ProgressInfo>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        if let Err(e) = self.sender.try_send(progress) {
            log::debug!("Progress update dropped: {}", e);
        }
    }
}
