//! Планировщик воспроизведения
//!
//! Два взаимоисключающих режима: прослушивание одного клипа и
//! последовательный прогон списка. Планировщик сам не трогает звук: каждая
//! команда возвращает список действий, которые сессия выполняет над
//! `AudioOutput`. Загрузка аудио и пауза между клипами асинхронны, поэтому
//! каждое действие несёт номер поколения; события со старым номером
//! отбрасываются.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::clip::{Clip, ClipId};
use crate::error::{Result, StudioError};
use crate::media::AudioPayload;

/// Скорость прослушивания одного клипа
pub const AUDITION_RATE: f32 = 1.0;

/// Звуковой поток
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    /// Прослушивание одного клипа
    Audition,
    /// Последовательный прогон
    Run,
}

/// Вывод звука. Реализация сообщает об окончании клипа через
/// `Session::clip_finished` с тем же поколением, что получила в `play`.
pub trait AudioOutput: Send + Sync {
    fn play(&self, stream: Stream, audio: &AudioPayload, rate: f32, generation: u64) -> Result<()>;
    fn pause(&self, stream: Stream);
    fn resume(&self, stream: Stream);
    /// Остановить и выгрузить поток немедленно
    fn stop(&self, stream: Stream);
    fn seek(&self, stream: Stream, position: Duration);
    fn set_rate(&self, stream: Stream, rate: f32);
}

/// Вывод без звука для консольного режима: команды только пишутся в лог
#[derive(Debug, Clone, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&self, stream: Stream, audio: &AudioPayload, rate: f32, generation: u64) -> Result<()> {
        log::debug!(
            "{:?}: would play {} at {}x (generation {})",
            stream,
            audio.source.display(),
            rate,
            generation
        );
        Ok(())
    }

    fn pause(&self, _stream: Stream) {}

    fn resume(&self, _stream: Stream) {}

    fn stop(&self, _stream: Stream) {}

    fn seek(&self, _stream: Stream, _position: Duration) {}

    fn set_rate(&self, _stream: Stream, _rate: f32) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    SingleClip,
    SequentialRun,
}

/// Что нужно загрузить и запустить
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub stream: Stream,
    pub id: ClipId,
    pub index: usize,
    pub path: PathBuf,
    pub rate: f32,
    pub generation: u64,
}

/// Действие над выводом звука
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackAction {
    Load(LoadRequest),
    Stop(Stream),
    Pause(Stream),
    Resume(Stream),
    Seek { stream: Stream, position: Duration },
    SetRate { stream: Stream, rate: f32 },
    /// Выдержать паузу между клипами и вызвать `advance` с этим поколением
    Wait { delay: Duration, generation: u64 },
}

/// Состояние плеера для интерфейса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub state: PlayerState,
    pub mode: Option<PlaybackMode>,
    /// Позиция прогона в списке клипов
    pub position: Option<usize>,
    /// Клип, который сейчас прослушивается отдельно
    pub audition: Option<ClipId>,
    /// Номер текущего клипа среди клипов с аудио (с единицы)
    pub ordinal: usize,
    /// Число клипов с аудио
    pub playable: usize,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy)]
struct Loaded {
    stream: Stream,
    duration: Option<f64>,
    generation: u64,
}

/// Длительность от внешнего сервиса; отрицательные и нечисловые значения отбрасываются
pub(crate) fn valid_duration(seconds: Option<f64>) -> Option<f64> {
    seconds.filter(|s| s.is_finite() && *s >= 0.0)
}

fn next_playable(clips: &[Clip], from: usize) -> Option<usize> {
    (from..clips.len()).find(|&i| clips[i].has_audio())
}

fn prev_playable(clips: &[Clip], before: usize) -> Option<usize> {
    (0..before.min(clips.len())).rev().find(|&i| clips[i].has_audio())
}

/// Автомат воспроизведения одной сессии
#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlayerState,
    mode: Option<PlaybackMode>,
    /// Позиция прогона; используется, если клип прогона исчез из списка
    position: usize,
    current: Option<ClipId>,
    audition: Option<ClipId>,
    loaded: Option<Loaded>,
    speed: f32,
    gap: Duration,
    generation: u64,
}

impl PlaybackScheduler {
    pub fn new(gap: Duration, speed: f32) -> Self {
        Self {
            state: PlayerState::Idle,
            mode: None,
            position: 0,
            current: None,
            audition: None,
            loaded: None,
            speed: speed.clamp(0.25, 4.0),
            gap,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.mode
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Действительно ли ещё поколение
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn current_index(&self, clips: &[Clip]) -> usize {
        self.current
            .and_then(|id| clips.iter().position(|clip| clip.id == id))
            .unwrap_or(self.position)
    }

    pub fn status(&self, clips: &[Clip]) -> PlayerStatus {
        let position = match self.mode {
            Some(PlaybackMode::SequentialRun) => Some(self.current_index(clips)),
            _ => None,
        };
        let ordinal = position
            .map(|index| clips.iter().take(index + 1).filter(|clip| clip.has_audio()).count())
            .unwrap_or(0);
        PlayerStatus {
            state: self.state,
            mode: self.mode,
            position,
            audition: self.audition,
            ordinal,
            playable: clips.iter().filter(|clip| clip.has_audio()).count(),
            speed: self.speed,
        }
    }

    /// Остановить загруженный поток и сделать недействительными
    /// все ожидающие события
    fn halt(&mut self) -> Vec<PlaybackAction> {
        self.generation += 1;
        match self.loaded.take() {
            Some(loaded) => vec![PlaybackAction::Stop(loaded.stream)],
            None => Vec::new(),
        }
    }

    fn load_run(&mut self, index: usize, clips: &[Clip]) -> Vec<PlaybackAction> {
        let clip = &clips[index];
        let Some(path) = clip.audio.clone() else {
            return Vec::new();
        };
        self.generation += 1;
        self.mode = Some(PlaybackMode::SequentialRun);
        self.state = PlayerState::Playing;
        self.position = index;
        self.current = Some(clip.id);
        self.loaded = Some(Loaded {
            stream: Stream::Run,
            duration: valid_duration(clip.duration),
            generation: self.generation,
        });
        log::debug!("Playing clip {} of the run", index + 1);
        vec![PlaybackAction::Load(LoadRequest {
            stream: Stream::Run,
            id: clip.id,
            index,
            path,
            rate: self.speed,
            generation: self.generation,
        })]
    }

    /// Прогон дошёл до конца
    fn finish(&mut self) -> Vec<PlaybackAction> {
        let actions = self.halt();
        self.state = PlayerState::Idle;
        self.mode = None;
        self.current = None;
        self.position = 0;
        log::debug!("Playback finished");
        actions
    }

    /// Прослушать один клип. Повторный вызов для того же клипа останавливает его.
    pub fn audition(&mut self, id: ClipId, clips: &[Clip]) -> Vec<PlaybackAction> {
        let Some((index, clip)) = clips.iter().enumerate().find(|(_, clip)| clip.id == id) else {
            log::debug!("Audition ignored: clip {} is gone", id);
            return Vec::new();
        };
        let Some(path) = clip.audio.clone() else {
            return Vec::new();
        };

        let same_clip = self.mode == Some(PlaybackMode::SingleClip) && self.audition == Some(id);
        let mut actions = self.halt();
        if same_clip {
            self.state = PlayerState::Idle;
            self.mode = None;
            self.audition = None;
            return actions;
        }

        self.mode = Some(PlaybackMode::SingleClip);
        self.state = PlayerState::Playing;
        self.audition = Some(id);
        self.loaded = Some(Loaded {
            stream: Stream::Audition,
            duration: valid_duration(clip.duration),
            generation: self.generation,
        });
        actions.push(PlaybackAction::Load(LoadRequest {
            stream: Stream::Audition,
            id,
            index,
            path,
            rate: AUDITION_RATE,
            generation: self.generation,
        }));
        actions
    }

    /// Начать прогон с клипа `start` (или с ближайшего следующего с аудио)
    pub fn play_from(&mut self, start: usize, clips: &[Clip]) -> Result<Vec<PlaybackAction>> {
        let index = next_playable(clips, start)
            .ok_or_else(|| StudioError::user_input("no synthesized audio to play"))?;
        let mut actions = self.halt();
        self.audition = None;
        actions.extend(self.load_run(index, clips));
        Ok(actions)
    }

    pub fn play_all(&mut self, clips: &[Clip]) -> Result<Vec<PlaybackAction>> {
        self.play_from(0, clips)
    }

    /// Клип доиграл до конца
    pub fn clip_finished(&mut self, stream: Stream, generation: u64) -> Vec<PlaybackAction> {
        match self.loaded {
            Some(loaded) if loaded.stream == stream && loaded.generation == generation => {}
            _ => {
                log::debug!("Ignoring end of stale {:?} stream", stream);
                return Vec::new();
            }
        }
        self.loaded = None;

        match stream {
            Stream::Audition => {
                self.state = PlayerState::Idle;
                self.mode = None;
                self.audition = None;
                Vec::new()
            }
            Stream::Run => vec![PlaybackAction::Wait {
                delay: self.gap,
                generation,
            }],
        }
    }

    /// Пауза между клипами истекла: перейти к следующему клипу с аудио
    pub fn advance(&mut self, generation: u64, clips: &[Clip]) -> Vec<PlaybackAction> {
        if !self.is_current(generation) || self.mode != Some(PlaybackMode::SequentialRun) {
            return Vec::new();
        }
        let start = match self.current.and_then(|id| clips.iter().position(|clip| clip.id == id)) {
            Some(index) => index + 1,
            None => self.position,
        };

        match next_playable(clips, start) {
            Some(index) if self.state == PlayerState::Playing => self.load_run(index, clips),
            Some(index) => {
                self.position = index;
                self.current = Some(clips[index].id);
                Vec::new()
            }
            None => self.finish(),
        }
    }

    /// Аудио не удалось загрузить: прогон переходит дальше без паузы,
    /// прослушивание сбрасывается
    pub fn load_failed(&mut self, generation: u64, clips: &[Clip]) -> Vec<PlaybackAction> {
        if !self.is_current(generation) {
            return Vec::new();
        }
        self.loaded = None;
        match self.mode {
            Some(PlaybackMode::SequentialRun) => self.advance(generation, clips),
            _ => {
                self.state = PlayerState::Idle;
                self.mode = None;
                self.audition = None;
                Vec::new()
            }
        }
    }

    /// Длительность стала известна после загрузки
    pub fn set_duration(&mut self, generation: u64, seconds: Option<f64>) {
        if let Some(loaded) = self.loaded.as_mut().filter(|loaded| loaded.generation == generation) {
            if let Some(seconds) = valid_duration(seconds) {
                loaded.duration = Some(seconds);
            }
        }
    }

    fn run_is_active(&self) -> bool {
        self.mode == Some(PlaybackMode::SequentialRun) && self.state != PlayerState::Idle
    }

    fn skip_to(&mut self, index: usize, clips: &[Clip]) -> Vec<PlaybackAction> {
        if self.run_is_active() && self.state == PlayerState::Playing {
            let mut actions = self.halt();
            actions.extend(self.load_run(index, clips));
            return actions;
        }

        let actions = if self.run_is_active() { self.halt() } else { Vec::new() };
        self.position = index;
        self.current = Some(clips[index].id);
        actions
    }

    /// Следующий клип с аудио; в конце списка ничего не происходит
    pub fn next(&mut self, clips: &[Clip]) -> Vec<PlaybackAction> {
        let from = self.current_index(clips);
        let start = if self.current.is_some() || self.run_is_active() { from + 1 } else { from };
        match next_playable(clips, start.max(from + 1)) {
            Some(index) => self.skip_to(index, clips),
            None => Vec::new(),
        }
    }

    /// Предыдущий клип с аудио; в начале списка ничего не происходит
    pub fn prev(&mut self, clips: &[Clip]) -> Vec<PlaybackAction> {
        let from = self.current_index(clips);
        match prev_playable(clips, from) {
            Some(index) => self.skip_to(index, clips),
            None => Vec::new(),
        }
    }

    /// Пауза / продолжение. Из состояния покоя начинает прогон с текущей позиции.
    pub fn toggle(&mut self, clips: &[Clip]) -> Result<Vec<PlaybackAction>> {
        match (self.state, self.loaded) {
            (PlayerState::Playing, loaded) => {
                self.state = PlayerState::Paused;
                Ok(loaded.map(|l| PlaybackAction::Pause(l.stream)).into_iter().collect())
            }
            (PlayerState::Paused, Some(loaded)) => {
                self.state = PlayerState::Playing;
                Ok(vec![PlaybackAction::Resume(loaded.stream)])
            }
            (PlayerState::Paused, None) => {
                let start = self.current_index(clips);
                match next_playable(clips, start) {
                    Some(index) => Ok(self.load_run(index, clips)),
                    None => Ok(self.finish()),
                }
            }
            (PlayerState::Idle, _) => self.play_from(self.position, clips),
        }
    }

    /// Перемотка загруженного клипа; `fraction` в диапазоне 0..=1
    pub fn seek(&mut self, fraction: f64) -> Vec<PlaybackAction> {
        let Some(loaded) = self.loaded else {
            return Vec::new();
        };
        let Some(duration) = loaded.duration else {
            log::debug!("Seek ignored: duration unknown");
            return Vec::new();
        };
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        match Duration::try_from_secs_f64(duration * fraction) {
            Ok(position) => vec![PlaybackAction::Seek {
                stream: loaded.stream,
                position,
            }],
            Err(e) => {
                log::debug!("Seek ignored: {}", e);
                Vec::new()
            }
        }
    }

    /// Скорость прогона; действует на текущий и последующие клипы
    pub fn set_speed(&mut self, rate: f32) -> Vec<PlaybackAction> {
        self.speed = if rate.is_finite() { rate.clamp(0.25, 4.0) } else { 1.0 };
        match self.loaded {
            Some(loaded) if loaded.stream == Stream::Run => vec![PlaybackAction::SetRate {
                stream: Stream::Run,
                rate: self.speed,
            }],
            _ => Vec::new(),
        }
    }

    /// Остановить воспроизведение; позиция прогона сохраняется
    pub fn stop(&mut self) -> Vec<PlaybackAction> {
        let actions = self.halt();
        self.state = PlayerState::Idle;
        self.mode = None;
        self.audition = None;
        actions
    }

    /// Закрыть плеер: остановка и сброс позиции
    pub fn close(&mut self) -> Vec<PlaybackAction> {
        let actions = self.stop();
        self.position = 0;
        self.current = None;
        actions
    }
}
