//! Координатор синтеза
//!
//! Клипы синтезируются строго по одному и по порядку списка: прогресс и
//! точки остановки определены через число уже обработанных клипов. Флаг
//! остановки проверяется перед каждым клипом; начатый синтез доводится до
//! конца.
//!
//! Состояние клипов захватывается только на время чтения и записи, во время
//! запроса к движку блокировка не держится. Поэтому результат проверяется
//! при записи: если клип удалён или его текст изменился, результат
//! отбрасывается.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crate::clip::{ClipId, ClipStatus};
use crate::config::{Language, StudioConfig};
use crate::edit::NarrationEditor;
use crate::error::{Result, StudioError};
use crate::playback::valid_duration;
use crate::progress::ProgressTracker;
use crate::services::{SpeechSynthesizer, SynthesisOutput, SynthesisRequest};

/// Доступ к правкам озвучки под блокировкой
pub trait NarrationAccess: Send + Sync {
    fn with_narration<R>(&self, f: impl FnOnce(&mut NarrationEditor) -> R) -> R;
}

impl NarrationAccess for parking_lot::Mutex<NarrationEditor> {
    fn with_narration<R>(&self, f: impl FnOnce(&mut NarrationEditor) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Флаг кооперативной остановки массового синтеза
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запросить остановку; текущий клип будет досинтезирован
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Параметры синтеза, общие для всех клипов сценария
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    pub language: Language,
    pub voice: String,
    pub speed: f32,
    pub quality: u8,
    /// Префикс имён файлов (имя сценария)
    pub stem: String,
    pub output_folder: Option<PathBuf>,
}

impl SynthesisSettings {
    pub fn from_config(config: &StudioConfig, stem: impl Into<String>, script_folder: Option<PathBuf>) -> Self {
        Self {
            language: config.language,
            voice: config.voice.clone(),
            speed: config.speed,
            quality: config.quality,
            stem: stem.into(),
            output_folder: config.output_folder.clone().or(script_folder),
        }
    }

    /// Имя файла клипа: `<stem>_<NNN>_<id>`, номер с единицы
    pub fn output_name(&self, index: usize, id: ClipId) -> String {
        format!("{}_{:03}_{}", self.stem, index + 1, id.short())
    }
}

/// Результат синтеза одного клипа
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    /// Аудио сохранено в клипе
    Done(SynthesisOutput),
    /// Движок вернул ошибку; прежнее аудио клипа не тронуто
    Failed(String),
    /// Клип изменился или был удалён во время синтеза; результат отброшен
    Stale,
    /// Клипа нет в списке
    Missing,
}

/// Чем закончился массовый синтез
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisRunStatus {
    Completed,
    Stopped,
}

/// Итог массового синтеза
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisReport {
    pub status: SynthesisRunStatus,
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    /// Клипы, у которых уже было аудио, и отброшенные результаты
    pub skipped: usize,
}

impl SynthesisReport {
    fn new(total: usize) -> Self {
        Self {
            status: SynthesisRunStatus::Completed,
            total,
            done: 0,
            failed: 0,
            skipped: 0,
        }
    }

    fn count(&mut self, outcome: &SynthesisOutcome) {
        match outcome {
            SynthesisOutcome::Done(_) => self.done += 1,
            SynthesisOutcome::Failed(_) => self.failed += 1,
            SynthesisOutcome::Stale | SynthesisOutcome::Missing => self.skipped += 1,
        }
    }

    /// Сообщение для пользователя
    pub fn message(&self) -> String {
        match self.status {
            SynthesisRunStatus::Completed if self.failed == 0 => "Synthesis complete".to_string(),
            SynthesisRunStatus::Completed => format!("Synthesis complete, {} failed", self.failed),
            SynthesisRunStatus::Stopped => "Synthesis stopped".to_string(),
        }
    }
}

/// Снимает флаг "идёт синтез" при выходе из массовой операции
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Последовательный синтез клипов через внешний движок
pub struct SynthesisCoordinator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    stop: StopHandle,
    running: AtomicBool,
}

impl SynthesisCoordinator {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            stop: StopHandle::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn begin_run(&self) -> Result<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| StudioError::Busy("synthesis".to_string()))?;
        self.stop.reset();
        Ok(RunGuard(&self.running))
    }

    /// Синтезировать один клип. Пока идёт другой синтез, возвращает `Busy`:
    /// к движку одновременно уходит не больше одного запроса.
    pub async fn synthesize_one<A: NarrationAccess>(
        &self,
        access: &A,
        id: ClipId,
        settings: &SynthesisSettings,
    ) -> Result<SynthesisOutcome> {
        let _guard = self.begin_run()?;
        Ok(self.synthesize_clip(access, id, settings).await)
    }

    async fn synthesize_clip<A: NarrationAccess>(
        &self,
        access: &A,
        id: ClipId,
        settings: &SynthesisSettings,
    ) -> SynthesisOutcome {
        let prepared = access.with_narration(|editor| {
            let index = editor.clips().position(id)?;
            let clip = editor.clips_mut().find_mut(id)?;
            clip.status = ClipStatus::InProgress;
            Some((index, clip.text.clone()))
        });
        let Some((index, text)) = prepared else {
            log::debug!("Synthesis skipped: clip {} is gone", id);
            return SynthesisOutcome::Missing;
        };

        let request = SynthesisRequest {
            text: text.clone(),
            language: settings.language,
            voice: settings.voice.clone(),
            speed: settings.speed,
            quality: settings.quality,
            output_name: settings.output_name(index, id),
            output_folder: settings.output_folder.clone(),
        };
        let result = self.synthesizer.synthesize(&request).await;

        access.with_narration(|editor| {
            let Some(clip) = editor.clips_mut().find_mut(id) else {
                log::debug!("Discarding synthesis result: clip {} was removed", id);
                return SynthesisOutcome::Stale;
            };
            if clip.text != text {
                log::debug!("Discarding synthesis result: clip {} text changed", id);
                return SynthesisOutcome::Stale;
            }

            match result {
                Ok(output) => {
                    clip.audio = Some(output.path.clone());
                    clip.duration = valid_duration(output.duration);
                    clip.status = ClipStatus::Done;
                    clip.synthesized = true;
                    editor.cache_mut().invalidate(id);
                    SynthesisOutcome::Done(output)
                }
                Err(e) => {
                    log::error!("Synthesis of clip {} failed: {}", index + 1, e);
                    clip.status = ClipStatus::Failed;
                    SynthesisOutcome::Failed(e.to_string())
                }
            }
        })
    }

    /// Синтезировать все клипы без готового аудио
    pub async fn synthesize_all<A: NarrationAccess>(
        &self,
        access: &A,
        settings: &SynthesisSettings,
        tracker: Option<&ProgressTracker>,
    ) -> Result<SynthesisReport> {
        let _guard = self.begin_run()?;
        self.run(access, settings, tracker, false).await
    }

    /// Перегенерировать все клипы (после смены голоса или настроек).
    /// Правка записывается в историю, кэш аудио очищается.
    pub async fn regenerate_all<A: NarrationAccess>(
        &self,
        access: &A,
        settings: &SynthesisSettings,
        tracker: Option<&ProgressTracker>,
    ) -> Result<SynthesisReport> {
        let _guard = self.begin_run()?;
        access.with_narration(|editor| {
            editor.record_snapshot();
            editor.cache_mut().clear();
        });
        self.run(access, settings, tracker, true).await
    }

    async fn run<A: NarrationAccess>(
        &self,
        access: &A,
        settings: &SynthesisSettings,
        tracker: Option<&ProgressTracker>,
        regenerate: bool,
    ) -> Result<SynthesisReport> {
        // Порядок фиксируется в начале; клипы, удалённые по ходу, пропускаются
        let ids = access.with_narration(|editor| editor.clips().ids());
        let total = ids.len();
        let mut report = SynthesisReport::new(total);
        log::info!("Starting synthesis of {} clips", total);

        for (i, id) in ids.into_iter().enumerate() {
            if self.stop.is_stop_requested() {
                report.status = SynthesisRunStatus::Stopped;
                log::info!("Synthesis stopped after {} of {} clips", i, total);
                if let Some(tracker) = tracker {
                    tracker.stopped(report.message());
                }
                return Ok(report);
            }

            if let Some(tracker) = tracker {
                tracker.update_items(i, total, Some(format!("Synthesizing sentence {}/{}", i + 1, total)));
            }

            let ready = access.with_narration(|editor| {
                editor
                    .clips()
                    .find(id)
                    .map(|clip| clip.has_audio() && clip.status == ClipStatus::Done)
            });
            match ready {
                None => {
                    report.skipped += 1;
                    continue;
                }
                Some(true) if !regenerate => {
                    report.skipped += 1;
                    continue;
                }
                Some(_) => {}
            }

            let outcome = self.synthesize_clip(access, id, settings).await;
            report.count(&outcome);
        }

        log::info!(
            "Synthesis finished: {} done, {} failed, {} skipped",
            report.done,
            report.failed,
            report.skipped
        );
        if let Some(tracker) = tracker {
            tracker.complete(report.message());
        }
        Ok(report)
    }
}
