//! Сессия редактора
//!
//! `Session` - дешёвый клонируемый хендл над общим состоянием и внешними
//! сервисами. Все изменения состояния выполняются под блокировкой, которая
//! никогда не удерживается через `.await`: долгие операции читают нужное,
//! отпускают блокировку, ждут сервис и снова захватывают её для записи.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::{Mutex, MutexGuard};
use crate::clip::{Clip, ClipId};
use crate::commands::{CommandOutcome, FocusMove, InputSource, StudioCommand, Workflow};
use crate::config::StudioConfig;
use crate::edit::{EditFocus, EditOutcome, EditTarget, NarrationEditor, SubtitleEditor};
use crate::error::{Result, StudioError};
use crate::media::{FfmpegMerger, FileAudioLoader};
use crate::playback::{AudioOutput, PlaybackAction, PlaybackScheduler, PlayerStatus, Stream};
use crate::progress::{ProcessStep, ProgressTracker};
use crate::script::{read_script, split_into_sentences, ScriptInfo};
use crate::services::{AudioLoader, AudioMerger, FileDialog, FileSelection, ProjectExporter, SpeechAligner, SpeechSynthesizer};
use crate::subtitle::srt::SrtExporter;
use crate::subtitle::Timecode;
use crate::tts::{NarrationAccess, StopHandle, SynthesisCoordinator, SynthesisOutcome, SynthesisReport, SynthesisSettings};

/// Внешние сервисы сессии
#[derive(Clone)]
pub struct Collaborators {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub aligner: Option<Arc<dyn SpeechAligner>>,
    pub merger: Arc<dyn AudioMerger>,
    pub exporter: Arc<dyn ProjectExporter>,
    pub loader: Arc<dyn AudioLoader>,
    pub output: Arc<dyn AudioOutput>,
    pub dialog: Option<Arc<dyn FileDialog>>,
}

impl Collaborators {
    /// Синтез и вывод звука обязательны; склейка через FFmpeg, экспорт в SRT
    /// и чтение аудио с диска подставляются по умолчанию
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, output: Arc<dyn AudioOutput>) -> Self {
        Self {
            synthesizer,
            aligner: None,
            merger: Arc::new(FfmpegMerger),
            exporter: Arc::new(SrtExporter::default()),
            loader: Arc::new(FileAudioLoader),
            output,
            dialog: None,
        }
    }

    pub fn with_aligner(mut self, aligner: Arc<dyn SpeechAligner>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    pub fn with_merger(mut self, merger: Arc<dyn AudioMerger>) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn ProjectExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn AudioLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_dialog(mut self, dialog: Arc<dyn FileDialog>) -> Self {
        self.dialog = Some(dialog);
        self
    }
}

/// Состояние одной сессии редактора
#[derive(Debug)]
pub struct SessionState {
    config: StudioConfig,
    workflow: Workflow,
    /// Открытый редактор текста
    focus: Option<EditFocus>,
    narration: NarrationEditor,
    subtitles: SubtitleEditor,
    player: PlaybackScheduler,
    script: Option<ScriptInfo>,
    subtitle_source: Option<ScriptInfo>,
    external_audio: Option<FileSelection>,
    last_export: Option<PathBuf>,
}

impl SessionState {
    fn new(config: StudioConfig) -> Self {
        Self {
            workflow: Workflow::Narration,
            focus: None,
            narration: NarrationEditor::new(config.history_depth, config.cache_capacity),
            subtitles: SubtitleEditor::new(config.history_depth),
            player: PlaybackScheduler::new(config.inter_clip_gap(), config.default_playback_speed),
            script: None,
            subtitle_source: None,
            external_audio: None,
            last_export: None,
            config,
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn workflow(&self) -> Workflow {
        self.workflow
    }

    pub fn focus(&self) -> Option<EditFocus> {
        self.focus
    }

    pub fn narration(&self) -> &NarrationEditor {
        &self.narration
    }

    pub fn subtitles(&self) -> &SubtitleEditor {
        &self.subtitles
    }

    pub fn player_status(&self) -> PlayerStatus {
        self.player.status(self.narration.clips().clips())
    }

    pub fn script(&self) -> Option<&ScriptInfo> {
        self.script.as_ref()
    }

    pub fn external_audio(&self) -> Option<&FileSelection> {
        self.external_audio.as_ref()
    }

    /// Последний экспортированный файл
    pub fn last_export(&self) -> Option<&Path> {
        self.last_export.as_deref()
    }

    /// Имя для выходных файлов: сценарий, затем файл субтитров
    fn output_stem(&self) -> String {
        self.script
            .as_ref()
            .or(self.subtitle_source.as_ref())
            .map(|info| info.stem.clone())
            .unwrap_or_else(|| "project".to_string())
    }

    fn output_folder(&self) -> Option<PathBuf> {
        self.config.output_folder.clone().or_else(|| {
            self.script
                .as_ref()
                .or(self.subtitle_source.as_ref())
                .map(|info| info.folder.clone())
        })
    }

    fn begin_edit(&mut self, target: EditTarget, cursor: usize) -> EditFocus {
        match target {
            EditTarget::Clip(_) => self.narration.begin_edit(),
            EditTarget::Line(_) => self.subtitles.begin_edit(),
        }
        let focus = EditFocus { target, cursor };
        self.focus = Some(focus);
        focus
    }

    fn accepts_commit(&self, target: EditTarget) -> bool {
        match target {
            EditTarget::Clip(_) => self.narration.state().accepts_commit(),
            EditTarget::Line(_) => self.subtitles.state().accepts_commit(),
        }
    }

    fn commit(&mut self, target: EditTarget, text: &str) -> EditOutcome {
        match target {
            EditTarget::Clip(id) => self.narration.commit_edit(id, text),
            EditTarget::Line(index) => self.subtitles.commit_edit(index, text),
        }
    }

    /// Соседний элемент и позиция курсора в нём
    fn neighbour(&self, target: EditTarget, to: FocusMove) -> Option<(EditTarget, usize)> {
        match target {
            EditTarget::Clip(id) => {
                let clips = self.narration.clips();
                let index = clips.position(id)?;
                let next = match to {
                    FocusMove::PreviousEnd => index.checked_sub(1)?,
                    FocusMove::NextStart => index + 1,
                };
                let clip = clips.get(next)?;
                let cursor = match to {
                    FocusMove::PreviousEnd => clip.char_len(),
                    FocusMove::NextStart => 0,
                };
                Some((EditTarget::Clip(clip.id), cursor))
            }
            EditTarget::Line(index) => {
                let next = match to {
                    FocusMove::PreviousEnd => index.checked_sub(1)?,
                    FocusMove::NextStart => index + 1,
                };
                let (line, _) = self.subtitles.store().get(next)?;
                let cursor = match to {
                    FocusMove::PreviousEnd => line.char_len(),
                    FocusMove::NextStart => 0,
                };
                Some((EditTarget::Line(next), cursor))
            }
        }
    }

    fn apply_edit(&mut self, outcome: EditOutcome) -> CommandOutcome {
        if let Some(focus) = outcome.focus() {
            self.focus = Some(focus);
        }
        outcome.into()
    }
}

struct Inner {
    state: Mutex<SessionState>,
    services: Collaborators,
    synthesis: SynthesisCoordinator,
}

/// Хендл сессии редактора
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl NarrationAccess for Session {
    fn with_narration<R>(&self, f: impl FnOnce(&mut NarrationEditor) -> R) -> R {
        f(&mut self.lock().narration)
    }
}

impl Session {
    pub fn new(config: StudioConfig, services: Collaborators) -> Result<Self> {
        config.validate()?;
        let synthesis = SynthesisCoordinator::new(services.synthesizer.clone());
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::new(config)),
                services,
                synthesis,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock()
    }

    /// Прочитать состояние под блокировкой
    pub fn inspect<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    pub fn clips(&self) -> Vec<Clip> {
        self.lock().narration.clips().snapshot()
    }

    pub fn clip_texts(&self) -> Vec<String> {
        self.lock().narration.clips().texts()
    }

    pub fn subtitle_texts(&self) -> Vec<String> {
        self.lock().subtitles.store().texts()
    }

    pub fn timecodes(&self) -> Vec<Timecode> {
        self.lock().subtitles.store().timecodes().to_vec()
    }

    pub fn player_status(&self) -> PlayerStatus {
        self.lock().player_status()
    }

    /// Флаг остановки массового синтеза для другой задачи (например, Ctrl-C)
    pub fn stop_handle(&self) -> StopHandle {
        self.inner.synthesis.stop_handle()
    }

    pub fn is_synthesizing(&self) -> bool {
        self.inner.synthesis.is_running()
    }

    /// Загрузить сценарий: текст режется на предложения, каждое становится клипом
    pub async fn load_script(&self, path: &Path) -> Result<usize> {
        let content = read_script(path).await?;
        let sentences = split_into_sentences(&content);
        if sentences.is_empty() {
            return Err(StudioError::user_input("file has no content"));
        }

        let (pending, count) = {
            let mut state = self.lock();
            let actions = state.player.close();
            let count = state.narration.load(sentences);
            state.script = Some(ScriptInfo::from_path(path));
            state.workflow = Workflow::Narration;
            state.focus = None;
            state.last_export = None;
            log::info!("Loaded script {} with {} sentences", path.display(), count);
            (self.perform(actions), count)
        };
        self.drive(pending).await;
        Ok(count)
    }

    /// Загрузить файл субтитров: одна непустая строка - одна строка субтитров
    pub async fn load_subtitles(&self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut state = self.lock();
        let count = state.subtitles.load(&content)?;
        state.subtitle_source = Some(ScriptInfo::from_path(path));
        state.workflow = Workflow::Subtitles;
        state.focus = None;
        Ok(count)
    }

    /// Выбрать внешний аудиофайл через диалог. `None` - пользователь отменил выбор.
    pub async fn select_external_audio(&self) -> Result<Option<FileSelection>> {
        let dialog = self
            .inner
            .services
            .dialog
            .clone()
            .ok_or_else(|| StudioError::Configuration("no file dialog configured".to_string()))?;
        let selection = dialog.pick_audio_file().await?;
        if let Some(selection) = &selection {
            log::info!("Selected external audio {}", selection.path.display());
            self.lock().external_audio = Some(selection.clone());
        }
        Ok(selection)
    }

    pub fn set_external_audio(&self, path: impl Into<PathBuf>) {
        self.lock().external_audio = Some(FileSelection::from_path(path));
    }

    fn synthesis_settings(&self) -> Result<SynthesisSettings> {
        let state = self.lock();
        let script = state
            .script
            .as_ref()
            .ok_or_else(|| StudioError::user_input("load a script first"))?;
        if state.narration.clips().is_empty() {
            return Err(StudioError::user_input("the script has no sentences"));
        }
        Ok(SynthesisSettings::from_config(
            &state.config,
            script.stem.clone(),
            Some(script.folder.clone()),
        ))
    }

    /// Синтезировать все клипы, у которых ещё нет аудио
    pub async fn synthesize_all(&self, tracker: Option<&ProgressTracker>) -> Result<SynthesisReport> {
        let settings = self.synthesis_settings()?;
        self.inner.synthesis.synthesize_all(self, &settings, tracker).await
    }

    /// Перегенерировать все клипы
    pub async fn regenerate_all(&self, tracker: Option<&ProgressTracker>) -> Result<SynthesisReport> {
        let settings = self.synthesis_settings()?;
        self.inner.synthesis.regenerate_all(self, &settings, tracker).await
    }

    pub async fn synthesize_one(&self, id: ClipId) -> Result<SynthesisOutcome> {
        let settings = self.synthesis_settings()?;
        self.inner.synthesis.synthesize_one(self, id, &settings).await
    }

    /// Склеить аудио всех синтезированных клипов по порядку
    pub async fn export_merged_audio(&self, tracker: Option<&ProgressTracker>) -> Result<PathBuf> {
        let path = self.merge_generated_audio(tracker).await?;
        if let Some(tracker) = tracker {
            tracker.complete("Export complete");
        }
        Ok(path)
    }

    async fn merge_generated_audio(&self, tracker: Option<&ProgressTracker>) -> Result<PathBuf> {
        let (files, name, folder) = {
            let state = self.lock();
            let files: Vec<PathBuf> = state
                .narration
                .clips()
                .clips()
                .iter()
                .filter_map(|clip| clip.audio.clone())
                .collect();
            (files, state.output_stem(), state.output_folder())
        };
        if files.is_empty() {
            return Err(StudioError::user_input("no synthesized audio to export"));
        }

        if let Some(tracker) = tracker {
            tracker.set_step(ProcessStep::AudioMerge);
            tracker.update_step_progress(0.0, Some("Merging audio files".to_string()));
        }
        let path = self
            .inner
            .services
            .merger
            .merge_audio(&files, &name, folder.as_deref())
            .await?;

        self.lock().last_export = Some(path.clone());
        Ok(path)
    }

    /// Выровнять строки субтитров по аудио и сохранить таймкоды
    async fn align(&self, audio: &Path, tracker: Option<&ProgressTracker>) -> Result<usize> {
        let aligner = self
            .inner
            .services
            .aligner
            .clone()
            .ok_or_else(|| StudioError::Configuration("no alignment engine configured".to_string()))?;
        let (lines, language) = {
            let state = self.lock();
            (state.subtitles.store().texts(), state.config.language)
        };
        if lines.is_empty() {
            return Err(StudioError::user_input("load a subtitle file first"));
        }

        if let Some(tracker) = tracker {
            tracker.set_step(ProcessStep::Alignment);
            tracker.update_step_progress(0.0, Some("Aligning subtitles".to_string()));
        }
        let timecodes = aligner.align_lines(audio, &lines, language).await?;

        let mut state = self.lock();
        if state.subtitles.store().texts() != lines {
            log::warn!("Subtitle lines changed during alignment; timecodes follow positions");
        }
        state.subtitles.set_timecodes(timecodes);
        Ok(state.subtitles.store().len())
    }

    /// Сгенерировать таймкоды по выбранному внешнему аудио
    pub async fn generate_timecodes(&self, tracker: Option<&ProgressTracker>) -> Result<usize> {
        let audio = self
            .lock()
            .external_audio
            .as_ref()
            .map(|selection| selection.path.clone())
            .ok_or_else(|| StudioError::user_input("select an audio file first"))?;
        let count = self.align(&audio, tracker).await?;
        if let Some(tracker) = tracker {
            tracker.complete("Timecodes generated");
        }
        Ok(count)
    }

    /// Экспорт проекта субтитров. Внешнее аудио имеет приоритет; без него
    /// склеивается синтезированная озвучка и строки выравниваются по ней.
    pub async fn export_project(&self, tracker: Option<&ProgressTracker>) -> Result<PathBuf> {
        let (external, has_generated, has_lines, has_timecodes) = {
            let state = self.lock();
            (
                state.external_audio.as_ref().map(|selection| selection.path.clone()),
                state.narration.clips().clips().iter().any(Clip::has_audio),
                !state.subtitles.store().is_empty(),
                state.subtitles.store().has_timecodes(),
            )
        };
        if external.is_none() && !has_generated {
            return Err(StudioError::user_input(
                "no audio: synthesize the script or select an audio file",
            ));
        }
        if !has_lines {
            return Err(StudioError::user_input("load a subtitle file first"));
        }

        let audio = match external {
            Some(path) => {
                if !has_timecodes {
                    self.align(&path, tracker).await?;
                }
                path
            }
            None => {
                let merged = self.merge_generated_audio(tracker).await?;
                self.align(&merged, tracker).await?;
                merged
            }
        };

        let (name, lines, timecodes, folder) = {
            let state = self.lock();
            (
                state.output_stem(),
                state.subtitles.store().texts(),
                state.subtitles.store().timecodes().to_vec(),
                state.output_folder(),
            )
        };
        if let Some(tracker) = tracker {
            tracker.set_step(ProcessStep::ProjectExport);
            tracker.update_step_progress(0.0, Some("Writing project".to_string()));
        }
        let path = self
            .inner
            .services
            .exporter
            .export_project(&name, &audio, &lines, &timecodes, folder.as_deref())
            .await?;

        log::info!("Exported project to {}", path.display());
        self.lock().last_export = Some(path.clone());
        if let Some(tracker) = tracker {
            tracker.complete("Project exported");
        }
        Ok(path)
    }

    /// Сбросить всё: воспроизведение, клипы, субтитры и обе истории
    pub async fn reset(&self) {
        self.stop_handle().request_stop();
        let pending = {
            let mut state = self.lock();
            let actions = state.player.close();
            state.narration.reset();
            state.subtitles.reset();
            state.focus = None;
            state.script = None;
            state.subtitle_source = None;
            state.external_audio = None;
            state.last_export = None;
            state.workflow = Workflow::Narration;
            self.perform(actions)
        };
        self.drive(pending).await;
        log::info!("Session reset");
    }

    /// Применить команду
    pub async fn dispatch(&self, command: StudioCommand) -> Result<CommandOutcome> {
        log::debug!("Dispatching {:?}", command);
        match command {
            StudioCommand::SwitchWorkflow(workflow) => {
                let mut state = self.lock();
                if state.workflow == workflow {
                    return Ok(CommandOutcome::Unchanged);
                }
                state.workflow = workflow;
                state.focus = None;
                Ok(CommandOutcome::Applied { focus: None })
            }
            StudioCommand::BeginEdit { target, cursor } => {
                let focus = self.lock().begin_edit(target, cursor);
                Ok(CommandOutcome::Applied { focus: Some(focus) })
            }
            StudioCommand::CommitEdit { target, text } => {
                let mut state = self.lock();
                if !state.accepts_commit(target) {
                    log::debug!("Stale commit for {:?} ignored", target);
                    return Ok(CommandOutcome::Ignored);
                }
                let outcome = state.commit(target, &text);
                if state.focus.map(|focus| focus.target) == Some(target) {
                    state.focus = None;
                }
                Ok(outcome.into())
            }
            StudioCommand::CancelEdit => {
                self.lock().focus = None;
                Ok(CommandOutcome::Unchanged)
            }
            StudioCommand::Split { target, offset, draft } => {
                let mut state = self.lock();
                let outcome = match target {
                    EditTarget::Clip(id) => state.narration.split(id, offset, draft.as_deref())?,
                    EditTarget::Line(index) => state.subtitles.split(index, offset, draft.as_deref())?,
                };
                Ok(state.apply_edit(outcome))
            }
            StudioCommand::MergeWithPrevious { target, draft } => {
                let mut state = self.lock();
                let outcome = match target {
                    EditTarget::Clip(id) => state.narration.merge_with_previous(id, draft.as_deref())?,
                    EditTarget::Line(index) => state.subtitles.merge_with_previous(index, draft.as_deref())?,
                };
                Ok(state.apply_edit(outcome))
            }
            StudioCommand::MergeWithNext { target, draft } => {
                let mut state = self.lock();
                let outcome = match target {
                    EditTarget::Clip(id) => state.narration.merge_with_next(id, draft.as_deref())?,
                    EditTarget::Line(index) => state.subtitles.merge_with_next(index, draft.as_deref())?,
                };
                Ok(state.apply_edit(outcome))
            }
            StudioCommand::MoveFocus { target, text, to } => {
                let mut state = self.lock();
                if state.accepts_commit(target) {
                    state.commit(target, &text);
                }
                match state.neighbour(target, to) {
                    Some((next, cursor)) => {
                        let focus = state.begin_edit(next, cursor);
                        Ok(CommandOutcome::Applied { focus: Some(focus) })
                    }
                    None => Ok(CommandOutcome::Unchanged),
                }
            }
            StudioCommand::SetTimestamp { index, edge, input } => {
                let changed = self.lock().subtitles.set_timestamp(index, edge, &input).is_some();
                Ok(CommandOutcome::from_flag(changed))
            }
            StudioCommand::Undo(source) => Ok(self.undo_redo(source, true)),
            StudioCommand::Redo(source) => Ok(self.undo_redo(source, false)),

            StudioCommand::Audition(id) => self.play(|player, clips| Ok(player.audition(id, clips))).await,
            StudioCommand::PlayAll => self.play(|player, clips| player.play_all(clips)).await,
            StudioCommand::PlayFrom(index) => self.play(|player, clips| player.play_from(index, clips)).await,
            StudioCommand::PlayerPrev => self.play(|player, clips| Ok(player.prev(clips))).await,
            StudioCommand::PlayerNext => self.play(|player, clips| Ok(player.next(clips))).await,
            StudioCommand::PlayerToggle => self.play(|player, clips| player.toggle(clips)).await,
            StudioCommand::Seek(fraction) => self.play(|player, _| Ok(player.seek(fraction))).await,
            StudioCommand::SetSpeed(rate) => self.play(|player, _| Ok(player.set_speed(rate))).await,
            StudioCommand::StopPlayback => self.play(|player, _| Ok(player.stop())).await,
            StudioCommand::ClosePlayer => self.play(|player, _| Ok(player.close())).await,

            StudioCommand::StopSynthesis => {
                if !self.is_synthesizing() {
                    return Ok(CommandOutcome::Unchanged);
                }
                log::info!("Stop requested for synthesis");
                self.stop_handle().request_stop();
                Ok(CommandOutcome::Applied { focus: None })
            }
            StudioCommand::Reset => {
                self.reset().await;
                Ok(CommandOutcome::Applied { focus: None })
            }
        }
    }

    /// Отмена/повтор в активном режиме. С клавиатуры подавляется, пока
    /// открыт редактор текста: там работает собственная отмена поля ввода.
    fn undo_redo(&self, source: InputSource, undo: bool) -> CommandOutcome {
        let mut state = self.lock();
        if source == InputSource::Keyboard && state.focus.is_some() {
            return CommandOutcome::Ignored;
        }
        let changed = match (state.workflow, undo) {
            (Workflow::Narration, true) => state.narration.undo(),
            (Workflow::Narration, false) => state.narration.redo(),
            (Workflow::Subtitles, true) => state.subtitles.undo(),
            (Workflow::Subtitles, false) => state.subtitles.redo(),
        };
        if changed {
            state.focus = None;
            log::debug!("{} applied in {:?}", if undo { "Undo" } else { "Redo" }, state.workflow);
        }
        CommandOutcome::from_flag(changed)
    }

    /// Выполнить команду планировщика воспроизведения
    async fn play<F>(&self, command: F) -> Result<CommandOutcome>
    where
        F: FnOnce(&mut PlaybackScheduler, &[Clip]) -> Result<Vec<PlaybackAction>>,
    {
        let (pending, changed) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let clips = state.narration.clips().clips();
            let before = state.player.status(clips);
            let actions = command(&mut state.player, clips)?;
            let changed = !actions.is_empty() || state.player.status(clips) != before;
            (self.perform(actions), changed)
        };
        self.drive(pending).await;
        Ok(CommandOutcome::from_flag(changed))
    }

    /// Клип доиграл. Вызывается реализацией `AudioOutput` с поколением,
    /// полученным в `play`; выдерживает паузу и запускает следующий клип.
    pub async fn clip_finished(&self, stream: Stream, generation: u64) {
        let pending = {
            let mut state = self.lock();
            let actions = state.player.clip_finished(stream, generation);
            self.perform(actions)
        };
        self.drive(pending).await;
    }

    /// Выполнить мгновенные действия; загрузка и ожидание возвращаются
    /// для асинхронного выполнения. Вызывается под блокировкой состояния.
    fn perform(&self, actions: Vec<PlaybackAction>) -> VecDeque<PlaybackAction> {
        let output = &self.inner.services.output;
        let mut pending = VecDeque::new();
        for action in actions {
            match action {
                PlaybackAction::Stop(stream) => output.stop(stream),
                PlaybackAction::Pause(stream) => output.pause(stream),
                PlaybackAction::Resume(stream) => output.resume(stream),
                PlaybackAction::Seek { stream, position } => output.seek(stream, position),
                PlaybackAction::SetRate { stream, rate } => output.set_rate(stream, rate),
                deferred @ (PlaybackAction::Load(_) | PlaybackAction::Wait { .. }) => pending.push_back(deferred),
            }
        }
        pending
    }

    async fn drive(&self, mut pending: VecDeque<PlaybackAction>) {
        while let Some(action) = pending.pop_front() {
            match action {
                PlaybackAction::Load(request) => {
                    let cached = self
                        .lock()
                        .narration
                        .cache_mut()
                        .get(request.id)
                        .filter(|payload| payload.source == request.path);
                    let loaded = match cached {
                        Some(payload) => Ok(payload),
                        None => self.inner.services.loader.load_audio(&request.path).await,
                    };

                    let mut guard = self.lock();
                    let state = &mut *guard;
                    if !state.player.is_current(request.generation) {
                        log::debug!("Dropping audio for clip {}: playback moved on", request.id);
                        continue;
                    }
                    let started = loaded.and_then(|payload| {
                        let still_current = state
                            .narration
                            .clips()
                            .find(request.id)
                            .and_then(|clip| clip.audio.as_ref())
                            == Some(&request.path);
                        if still_current {
                            state.narration.cache_mut().insert(request.id, payload.clone());
                        }
                        state.player.set_duration(request.generation, payload.duration);
                        self.inner
                            .services
                            .output
                            .play(request.stream, &payload, request.rate, request.generation)
                    });
                    if let Err(e) = started {
                        log::warn!("Could not play clip {}: {}", request.index + 1, e);
                        let actions = state
                            .player
                            .load_failed(request.generation, state.narration.clips().clips());
                        pending.extend(self.perform(actions));
                    }
                }
                PlaybackAction::Wait { delay, generation } => {
                    tokio::time::sleep(delay).await;
                    let mut guard = self.lock();
                    let state = &mut *guard;
                    let actions = state.player.advance(generation, state.narration.clips().clips());
                    pending.extend(self.perform(actions));
                }
                immediate => pending.extend(self.perform(vec![immediate])),
            }
        }
    }
}
