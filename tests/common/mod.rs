//! Подставные сервисы для интеграционных тестов

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;
use narration_studio::config::Language;
use narration_studio::media::AudioPayload;
use narration_studio::services::{
    AudioLoader, AudioMerger, ProjectExporter, SpeechAligner, SpeechSynthesizer, SynthesisOutput, SynthesisRequest,
};
use narration_studio::subtitle::{Timecode, Timestamp};
use narration_studio::tts::StopHandle;
use narration_studio::{AudioOutput, Collaborators, Result, Session, StudioConfig, StudioError, Stream};

/// Синтезатор, который "пишет" `<name>.wav` и запоминает запросы.
/// Текст, содержащий `FAIL`, завершается ошибкой.
#[derive(Default)]
pub struct FakeSynthesizer {
    pub requests: Mutex<Vec<SynthesisRequest>>,
    /// Запросить остановку после указанного числа успешных клипов
    pub stop_after: Mutex<Option<(usize, StopHandle)>>,
    /// Удерживать запрос до сигнала
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeSynthesizer {
    pub fn texts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.text.clone()).collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput> {
        self.requests.lock().push(request.clone());
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        if request.text.contains("FAIL") {
            return Err(StudioError::collaborator("synthesize", "engine rejected text"));
        }

        let done = self.requests.lock().len();
        if let Some((after, stop)) = &*self.stop_after.lock() {
            if done >= *after {
                stop.request_stop();
            }
        }

        let folder = request.output_folder.clone().unwrap_or_default();
        Ok(SynthesisOutput {
            path: folder.join(format!("{}.wav", request.output_name)),
            duration: Some(1.0 + request.text.len() as f64 / 10.0),
        })
    }
}

/// Загрузчик, не читающий диск
#[derive(Default)]
pub struct FakeLoader {
    pub loads: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl AudioLoader for FakeLoader {
    async fn load_audio(&self, path: &Path) -> Result<AudioPayload> {
        self.loads.lock().push(path.to_path_buf());
        if path.to_string_lossy().contains("broken") {
            return Err(StudioError::collaborator("load audio", "corrupt file"));
        }
        Ok(AudioPayload::new(path, Bytes::from_static(b"RIFF"), Some(2.0)))
    }
}

/// Одна команда, полученная выводом звука
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Play { stream: Stream, source: PathBuf, rate: f32, generation: u64 },
    Pause(Stream),
    Resume(Stream),
    Stop(Stream),
    Seek(Stream, Duration),
    Rate(Stream, f32),
}

#[derive(Default)]
pub struct RecordingOutput {
    pub events: Mutex<Vec<OutputEvent>>,
}

impl RecordingOutput {
    pub fn plays(&self) -> Vec<(Stream, PathBuf, f32, u64)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Play { stream, source, rate, generation } => {
                    Some((*stream, source.clone(), *rate, *generation))
                }
                _ => None,
            })
            .collect()
    }

    pub fn last_play(&self) -> Option<(Stream, PathBuf, f32, u64)> {
        self.plays().pop()
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&self, stream: Stream, audio: &AudioPayload, rate: f32, generation: u64) -> Result<()> {
        self.events.lock().push(OutputEvent::Play {
            stream,
            source: audio.source.clone(),
            rate,
            generation,
        });
        Ok(())
    }

    fn pause(&self, stream: Stream) {
        self.events.lock().push(OutputEvent::Pause(stream));
    }

    fn resume(&self, stream: Stream) {
        self.events.lock().push(OutputEvent::Resume(stream));
    }

    fn stop(&self, stream: Stream) {
        self.events.lock().push(OutputEvent::Stop(stream));
    }

    fn seek(&self, stream: Stream, position: Duration) {
        self.events.lock().push(OutputEvent::Seek(stream, position));
    }

    fn set_rate(&self, stream: Stream, rate: f32) {
        self.events.lock().push(OutputEvent::Rate(stream, rate));
    }
}

/// Выравнивание: каждой строке по секунде
#[derive(Default)]
pub struct FakeAligner {
    pub calls: Mutex<Vec<(PathBuf, Vec<String>, Language)>>,
    /// Вернуть на столько таймкодов меньше, чем строк
    pub short_by: Mutex<usize>,
}

#[async_trait]
impl SpeechAligner for FakeAligner {
    async fn align_lines(&self, audio: &Path, lines: &[String], language: Language) -> Result<Vec<Timecode>> {
        self.calls.lock().push((audio.to_path_buf(), lines.to_vec(), language));
        let count = lines.len().saturating_sub(*self.short_by.lock());
        Ok((0..count as u64)
            .map(|i| Timecode::new(Timestamp::from_millis(i * 1000), Timestamp::from_millis(i * 1000 + 900)))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeMerger {
    pub calls: Mutex<Vec<(Vec<PathBuf>, String)>>,
}

#[async_trait]
impl AudioMerger for FakeMerger {
    async fn merge_audio(&self, files: &[PathBuf], output_name: &str, output_folder: Option<&Path>) -> Result<PathBuf> {
        self.calls.lock().push((files.to_vec(), output_name.to_string()));
        let folder = output_folder.map(Path::to_path_buf).unwrap_or_default();
        Ok(folder.join(format!("{}_merged.wav", output_name)))
    }
}

#[derive(Default)]
pub struct FakeExporter {
    pub calls: Mutex<Vec<(String, PathBuf, Vec<String>, Vec<Timecode>)>>,
}

#[async_trait]
impl ProjectExporter for FakeExporter {
    async fn export_project(
        &self,
        name: &str,
        audio: &Path,
        lines: &[String],
        timecodes: &[Timecode],
        output_folder: Option<&Path>,
    ) -> Result<PathBuf> {
        self.calls
            .lock()
            .push((name.to_string(), audio.to_path_buf(), lines.to_vec(), timecodes.to_vec()));
        let folder = output_folder.map(Path::to_path_buf).unwrap_or_default();
        Ok(folder.join(format!("{}.vrew", name)))
    }
}

/// Сессия со всеми подставными сервисами
pub struct Harness {
    pub session: Session,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub loader: Arc<FakeLoader>,
    pub output: Arc<RecordingOutput>,
    pub aligner: Arc<FakeAligner>,
    pub merger: Arc<FakeMerger>,
    pub exporter: Arc<FakeExporter>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_synthesizer(FakeSynthesizer::default())
    }

    pub fn with_synthesizer(synthesizer: FakeSynthesizer) -> Self {
        let synthesizer = Arc::new(synthesizer);
        let loader = Arc::new(FakeLoader::default());
        let output = Arc::new(RecordingOutput::default());
        let aligner = Arc::new(FakeAligner::default());
        let merger = Arc::new(FakeMerger::default());
        let exporter = Arc::new(FakeExporter::default());

        let services = Collaborators::new(synthesizer.clone(), output.clone())
            .with_loader(loader.clone())
            .with_aligner(aligner.clone())
            .with_merger(merger.clone())
            .with_exporter(exporter.clone());
        let session = Session::new(StudioConfig::default(), services).unwrap();

        Self {
            session,
            synthesizer,
            loader,
            output,
            aligner,
            merger,
            exporter,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Загрузить сценарий из текста
    pub async fn load_script(&self, content: &str) -> usize {
        let path = self.write("script.txt", content);
        self.session.load_script(&path).await.unwrap()
    }
}
