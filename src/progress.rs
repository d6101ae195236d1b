//! Модуль для отслеживания прогресса длительных операций
//!
//! Массовый синтез, склейка, выравнивание и экспорт сообщают о ходе работы
//! через наблюдателей. Прогресс синтеза монотонен: он считается по числу
//! уже обработанных клипов.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Текущий этап операции
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения всей операции (0.0 - 100.0)
    pub total_progress: f32,
    /// Сообщение для пользователя
    pub details: Option<String>,
}

impl ProgressInfo {
    pub fn new(step: impl Into<String>, step_progress: f32, total_progress: f32, details: Option<String>) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Наблюдатель, получающий уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Объект, рассылающий уведомления о прогрессе
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя; возвращает идентификатор для удаления
    fn add_observer(&self, observer: Box<dyn ProgressObserver>) -> usize;

    fn remove_observer(&self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    fn notify_progress(&self, progress: ProgressInfo);
}

/// Синхронная рассылка всем наблюдателям
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.write().insert(id, observer);
        id
    }

    fn remove_observer(&self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        self.observers.write().remove(&id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        let observers = self.observers.read();
        for observer in observers.values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Репортер поверх broadcast канала Tokio: уведомления доставляются
/// наблюдателям из отдельной задачи, подписчики получают их напрямую
pub struct AsyncProgressReporter {
    tx: broadcast::Sender<ProgressInfo>,
    inner: Arc<DefaultProgressReporter>,
}

impl AsyncProgressReporter {
    pub fn new() -> (Self, broadcast::Receiver<ProgressInfo>) {
        let (tx, rx) = broadcast::channel(100);
        let reporter = Self {
            tx,
            inner: Arc::new(DefaultProgressReporter::new()),
        };
        (reporter, rx)
    }

    /// Ещё один приёмник уведомлений
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressInfo> {
        self.tx.subscribe()
    }

    /// Запустить задачу, пересылающую уведомления наблюдателям
    pub fn start_handler(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.tx.subscribe();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(progress) => inner.notify_progress(progress),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Progress handler skipped {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl ProgressReporter for AsyncProgressReporter {
    fn add_observer(&self, observer: Box<dyn ProgressObserver>) -> usize {
        self.inner.add_observer(observer)
    }

    fn remove_observer(&self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        self.inner.remove_observer(id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        if self.tx.send(progress).is_err() {
            log::debug!("No progress subscribers");
        }
    }
}

/// Этапы длительных операций
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStep {
    /// Синтез речи по клипам
    Synthesis,
    /// Склейка аудио клипов в один файл
    AudioMerge,
    /// Выравнивание субтитров по аудио
    Alignment,
    /// Запись файла проекта
    ProjectExport,
}

impl ProcessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthesis => "Synthesis",
            Self::AudioMerge => "Audio merge",
            Self::Alignment => "Alignment",
            Self::ProjectExport => "Project export",
        }
    }

    /// Вес этапа в общем прогрессе операции
    pub fn weight(&self) -> f32 {
        match self {
            Self::Synthesis => 60.0,
            Self::AudioMerge => 10.0,
            Self::Alignment => 25.0,
            Self::ProjectExport => 5.0,
        }
    }
}

/// Трекер прогресса одной операции, состоящей из последовательных этапов
pub struct ProgressTracker {
    reporter: Option<Arc<dyn ProgressReporter>>,
    /// Этапы операции; общий прогресс считается только по ним
    steps: Vec<ProcessStep>,
    current_step: RwLock<ProcessStep>,
    step_progress: RwLock<f32>,
    total_progress: RwLock<f32>,
    completed_steps: RwLock<HashMap<ProcessStep, f32>>,
}

impl ProgressTracker {
    /// Трекер без получателя: прогресс считается, но никуда не уходит
    pub fn new(steps: &[ProcessStep]) -> Self {
        let first = steps.first().copied().unwrap_or(ProcessStep::Synthesis);
        Self {
            reporter: None,
            steps: if steps.is_empty() { vec![first] } else { steps.to_vec() },
            current_step: RwLock::new(first),
            step_progress: RwLock::new(0.0),
            total_progress: RwLock::new(0.0),
            completed_steps: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_reporter(steps: &[ProcessStep], reporter: Arc<dyn ProgressReporter>) -> Self {
        let mut tracker = Self::new(steps);
        tracker.reporter = Some(reporter);
        tracker
    }

    pub fn current_step(&self) -> ProcessStep {
        *self.current_step.read()
    }

    pub fn total_progress(&self) -> f32 {
        *self.total_progress.read()
    }

    /// Перейти к этапу; предыдущий считается завершённым
    pub fn set_step(&self, step: ProcessStep) {
        {
            let mut current_step = self.current_step.write();
            if *current_step == step {
                return;
            }
            self.completed_steps.write().insert(*current_step, 100.0);
            *current_step = step;
            *self.step_progress.write() = 0.0;
        }
        self.update_total_progress();
        self.report_progress(None);
    }

    /// Обновить прогресс текущего этапа
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        *self.step_progress.write() = progress.clamp(0.0, 100.0);
        self.update_total_progress();
        self.report_progress(details);
    }

    /// Прогресс по числу обработанных элементов этапа
    pub fn update_items(&self, done: usize, total: usize, details: Option<String>) {
        let progress = if total == 0 { 100.0 } else { done as f32 / total as f32 * 100.0 };
        self.update_step_progress(progress, details);
    }

    fn update_total_progress(&self) {
        let total_weight: f32 = self.steps.iter().map(ProcessStep::weight).sum();
        let current_step = *self.current_step.read();
        let step_progress = *self.step_progress.read();

        let mut done = 0.0;
        {
            let completed_steps = self.completed_steps.read();
            for step in &self.steps {
                if *step == current_step {
                    done += step.weight() * step_progress / 100.0;
                } else if let Some(progress) = completed_steps.get(step) {
                    done += step.weight() * progress / 100.0;
                }
            }
        }

        *self.total_progress.write() = (done / total_weight * 100.0).clamp(0.0, 100.0);
    }

    fn report_progress(&self, details: Option<String>) {
        if let Some(reporter) = &self.reporter {
            let progress = ProgressInfo::new(
                self.current_step().as_str(),
                *self.step_progress.read(),
                self.total_progress(),
                details,
            );
            reporter.notify_progress(progress);
        }
    }

    /// Отметить завершение всей операции
    pub fn complete(&self, details: impl Into<String>) {
        let current_step = self.current_step();
        self.completed_steps.write().insert(current_step, 100.0);
        *self.step_progress.write() = 100.0;
        *self.total_progress.write() = 100.0;
        self.report_progress(Some(details.into()));
    }

    /// Сообщить о досрочной остановке; прогресс не меняется
    pub fn stopped(&self, details: impl Into<String>) {
        self.report_progress(Some(details.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::MemoryProgressObserver;

    fn tracker_with_memory(steps: &[ProcessStep]) -> (ProgressTracker, MemoryProgressObserver) {
        let reporter = Arc::new(DefaultProgressReporter::new());
        let observer = MemoryProgressObserver::new();
        reporter.add_observer(Box::new(observer.clone()));
        (ProgressTracker::with_reporter(steps, reporter), observer)
    }

    #[test]
    fn test_single_step_items() {
        let (tracker, observer) = tracker_with_memory(&[ProcessStep::Synthesis]);
        tracker.update_items(1, 4, Some("Synthesizing sentence 2/4".to_string()));

        let history = observer.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].step, "Synthesis");
        assert_eq!(history[0].step_progress, 25.0);
        assert_eq!(history[0].total_progress, 25.0);

        tracker.complete("Synthesis complete");
        let last = observer.history().pop().unwrap();
        assert_eq!(last.total_progress, 100.0);
        assert_eq!(last.details.as_deref(), Some("Synthesis complete"));
    }

    #[test]
    fn test_weighted_steps() {
        let (tracker, observer) = tracker_with_memory(&[ProcessStep::AudioMerge, ProcessStep::Alignment]);
        tracker.update_step_progress(100.0, None);
        tracker.set_step(ProcessStep::Alignment);

        let history = observer.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].step, "Alignment");
        assert_eq!(history[1].step_progress, 0.0);
        // склейка весит 10 из 35
        assert!((history[1].total_progress - 10.0 / 35.0 * 100.0).abs() < 0.01);
    }

    #[test]
    fn test_remove_observer() {
        let reporter = DefaultProgressReporter::new();
        let id = reporter.add_observer(Box::new(MemoryProgressObserver::new()));
        assert_eq!(reporter.observer_count(), 1);
        assert!(reporter.remove_observer(id).is_some());
        assert_eq!(reporter.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_async_reporter_delivers_to_subscribers() {
        let (reporter, mut rx) = AsyncProgressReporter::new();
        let observer = MemoryProgressObserver::new();
        reporter.add_observer(Box::new(observer.clone()));
        let handler = reporter.start_handler();

        reporter.notify_progress(ProgressInfo::new("Alignment", 50.0, 50.0, None));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.step_progress, 50.0);

        drop(reporter);
        handler.await.unwrap();
        assert_eq!(observer.history().len(), 1);
    }
}
