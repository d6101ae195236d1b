//! Движок правок
//!
//! Разделение, слияние и замена текста клипов озвучки и строк субтитров.
//! Каждая структурная правка сначала проверяет все условия, затем пишет
//! снимок в историю и только после этого меняет список, так что при отказе
//! состояние остаётся прежним.
//!
//! Смещения курсора считаются в символах, а не в байтах.

use serde::{Deserialize, Serialize};
use crate::clip::{Clip, ClipId, ClipStore};
use crate::error::{Result, StudioError};
use crate::history::{History, NarrationSnapshot, SubtitleSnapshot};
use crate::media::AudioCache;
use crate::subtitle::{SubtitleLine, SubtitleStore, Timecode, TimecodeEdge, Timestamp};

/// Что сейчас открыто на редактирование
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditTarget {
    /// Клип озвучки по идентификатору
    Clip(ClipId),
    /// Строка субтитров по позиции
    Line(usize),
}

/// Куда перевести фокус редактора после правки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditFocus {
    pub target: EditTarget,
    /// Позиция курсора в символах
    pub cursor: usize,
}

/// Результат правки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Правка применена и записана в историю
    Applied { focus: Option<EditFocus> },
    /// Ничего не изменилось
    Unchanged,
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }

    pub fn focus(&self) -> Option<EditFocus> {
        match self {
            EditOutcome::Applied { focus } => *focus,
            EditOutcome::Unchanged => None,
        }
    }
}

/// Состояние движка между структурной правкой и открытием нового редактора.
///
/// Пока разделение или слияние не "осело", запоздалая фиксация текста из
/// старого редактора (потеря фокуса при перерисовке) игнорируется.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Idle,
    SplitInProgress,
    MergeInProgress,
}

impl EngineState {
    /// Можно ли принять фиксацию текста
    pub fn accepts_commit(&self) -> bool {
        *self == EngineState::Idle
    }
}

/// Разрезать текст по смещению в символах. `None`, если одна из частей
/// после обрезки пробелов пуста.
fn split_text(text: &str, offset: usize) -> Option<(String, String)> {
    if offset == 0 {
        return None;
    }
    let (byte, _) = text.char_indices().nth(offset)?;
    let first = text[..byte].trim();
    let second = text[byte..].trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first.to_string(), second.to_string()))
}

/// Склеить два текста через один пробел; курсор встаёт в точку стыка
fn join_texts(left: &str, right: &str) -> (String, usize) {
    let left = left.trim();
    let right = right.trim();
    let merged = format!("{} {}", left, right).trim().to_string();
    let cursor = (left.chars().count() + 1).min(merged.chars().count());
    (merged, cursor)
}

fn empty_split_error() -> StudioError {
    StudioError::user_input("split would leave an empty clip")
}

/// Правки режима озвучки: список клипов, кэш аудио и история
#[derive(Debug)]
pub struct NarrationEditor {
    clips: ClipStore,
    cache: AudioCache,
    history: History<NarrationSnapshot>,
    state: EngineState,
}

impl NarrationEditor {
    pub fn new(history_depth: usize, cache_capacity: usize) -> Self {
        Self {
            clips: ClipStore::new(),
            cache: AudioCache::new(cache_capacity),
            history: History::new(history_depth),
            state: EngineState::Idle,
        }
    }

    /// Загрузить новый сценарий. Прежние клипы, кэш и история отбрасываются.
    pub fn load<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let count = self.clips.load(texts).len();
        self.cache.clear();
        self.history.clear();
        self.state = EngineState::Idle;
        log::info!("Loaded {} narration clips", count);
        count
    }

    pub fn clips(&self) -> &ClipStore {
        &self.clips
    }

    pub(crate) fn clips_mut(&mut self) -> &mut ClipStore {
        &mut self.clips
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut AudioCache {
        &mut self.cache
    }

    pub fn history(&self) -> &History<NarrationSnapshot> {
        &self.history
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Открыт новый редактор: структурная правка завершена
    pub fn begin_edit(&mut self) {
        self.state = EngineState::Idle;
    }

    /// Записать снимок перед массовой операцией (перегенерация всех клипов)
    pub(crate) fn record_snapshot(&mut self) {
        self.history.record(self.clips.snapshot());
    }

    /// Разделить клип по смещению `offset` в тексте `draft` (или в текущем
    /// тексте клипа, если черновика нет)
    pub fn split(&mut self, id: ClipId, offset: usize, draft: Option<&str>) -> Result<EditOutcome> {
        let Some(index) = self.clips.position(id) else {
            log::debug!("Split ignored: clip {} is gone", id);
            return Ok(EditOutcome::Unchanged);
        };
        let source = match draft {
            Some(text) => text.to_string(),
            None => self.clips.clips()[index].text.clone(),
        };
        let (first, second) = split_text(&source, offset).ok_or_else(empty_split_error)?;

        let first = Clip::new(first);
        let second = Clip::new(second);
        let focus = EditFocus {
            target: EditTarget::Clip(second.id),
            cursor: 0,
        };

        let before = self.clips.snapshot();
        self.clips.replace_range(index, 1, vec![first, second])?;
        self.history.record(before);
        self.cache.invalidate(id);
        self.state = EngineState::SplitInProgress;

        log::debug!("Split clip {} at {} into two clips", index, offset);
        Ok(EditOutcome::Applied { focus: Some(focus) })
    }

    /// Слить клип с предыдущим. `draft` - текст, набранный в редакторе клипа.
    pub fn merge_with_previous(&mut self, id: ClipId, draft: Option<&str>) -> Result<EditOutcome> {
        match self.clips.position(id) {
            Some(index) if index > 0 => self.merge_at(index - 1, draft, false),
            Some(_) => Ok(EditOutcome::Unchanged),
            None => {
                log::debug!("Merge ignored: clip {} is gone", id);
                Ok(EditOutcome::Unchanged)
            }
        }
    }

    /// Слить клип со следующим
    pub fn merge_with_next(&mut self, id: ClipId, draft: Option<&str>) -> Result<EditOutcome> {
        match self.clips.position(id) {
            Some(index) if index + 1 < self.clips.len() => self.merge_at(index, draft, true),
            Some(_) => Ok(EditOutcome::Unchanged),
            None => {
                log::debug!("Merge ignored: clip {} is gone", id);
                Ok(EditOutcome::Unchanged)
            }
        }
    }

    /// Слить клипы `left` и `left + 1`. Черновик относится к левому клипу,
    /// если `draft_is_left`, иначе к правому.
    fn merge_at(&mut self, left: usize, draft: Option<&str>, draft_is_left: bool) -> Result<EditOutcome> {
        let clips = self.clips.clips();
        let (left_clip, right_clip) = (&clips[left], &clips[left + 1]);
        let retired = [left_clip.id, right_clip.id];

        let (left_text, right_text) = match (draft, draft_is_left) {
            (Some(text), true) => (text, right_clip.text.as_str()),
            (Some(text), false) => (left_clip.text.as_str(), text),
            (None, _) => (left_clip.text.as_str(), right_clip.text.as_str()),
        };
        let (text, cursor) = join_texts(left_text, right_text);

        let merged = Clip::new(text);
        let focus = EditFocus {
            target: EditTarget::Clip(merged.id),
            cursor,
        };

        let before = self.clips.snapshot();
        self.clips.replace_range(left, 2, vec![merged])?;
        self.history.record(before);
        for id in retired {
            self.cache.invalidate(id);
        }
        self.state = EngineState::MergeInProgress;

        log::debug!("Merged clips {} and {}", left, left + 1);
        Ok(EditOutcome::Applied { focus: Some(focus) })
    }

    /// Заменить текст клипа. Пустой текст и текст без изменений игнорируются.
    pub fn replace_text(&mut self, id: ClipId, text: &str) -> EditOutcome {
        let text = text.trim();
        if text.is_empty() {
            return EditOutcome::Unchanged;
        }
        match self.clips.find(id) {
            Some(clip) if clip.text == text => return EditOutcome::Unchanged,
            Some(_) => {}
            None => {
                log::debug!("Text edit ignored: clip {} is gone", id);
                return EditOutcome::Unchanged;
            }
        }

        self.history.record(self.clips.snapshot());
        if let Some(clip) = self.clips.find_mut(id) {
            clip.text = text.to_string();
            clip.clear_audio();
        }
        self.cache.invalidate(id);
        EditOutcome::Applied { focus: None }
    }

    /// Зафиксировать текст из редактора. Игнорируется, пока структурная
    /// правка не завершена.
    pub fn commit_edit(&mut self, id: ClipId, text: &str) -> EditOutcome {
        if !self.state.accepts_commit() {
            log::debug!("Commit for clip {} suppressed while {:?}", id, self.state);
            return EditOutcome::Unchanged;
        }
        self.replace_text(id, text)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.clips.snapshot()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.clips.snapshot()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, clips: NarrationSnapshot) {
        self.clips.restore(clips);
        self.cache.clear();
        self.state = EngineState::Idle;
    }

    /// Сбросить всё состояние режима
    pub fn reset(&mut self) {
        self.clips.clear();
        self.cache.clear();
        self.history.clear();
        self.state = EngineState::Idle;
    }
}

/// Правки режима субтитров: строки, таймкоды и история
#[derive(Debug)]
pub struct SubtitleEditor {
    store: SubtitleStore,
    history: History<SubtitleSnapshot>,
    state: EngineState,
}

impl SubtitleEditor {
    pub fn new(history_depth: usize) -> Self {
        Self {
            store: SubtitleStore::new(),
            history: History::new(history_depth),
            state: EngineState::Idle,
        }
    }

    /// Загрузить содержимое файла субтитров
    pub fn load(&mut self, content: &str) -> Result<usize> {
        let count = self.store.load(content)?;
        self.history.clear();
        self.state = EngineState::Idle;
        log::info!("Loaded {} subtitle lines", count);
        Ok(count)
    }

    pub fn store(&self) -> &SubtitleStore {
        &self.store
    }

    pub fn history(&self) -> &History<SubtitleSnapshot> {
        &self.history
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn begin_edit(&mut self) {
        self.state = EngineState::Idle;
    }

    /// Подставить таймкоды, полученные выравниванием
    pub fn set_timecodes(&mut self, timecodes: Vec<Timecode>) {
        self.store.set_timecodes(timecodes);
    }

    /// Ручной ввод метки начала или конца строки
    pub fn set_timestamp(&mut self, index: usize, edge: TimecodeEdge, input: &str) -> Option<Timestamp> {
        self.store.set_timestamp(index, edge, input)
    }

    /// Разделить строку. Первая половина получает исходное начало, вторая -
    /// исходный конец; внутренняя граница остаётся нулевой.
    pub fn split(&mut self, index: usize, offset: usize, draft: Option<&str>) -> Result<EditOutcome> {
        let Some((line, timecode)) = self.store.get(index) else {
            log::debug!("Split ignored: subtitle line {} is gone", index);
            return Ok(EditOutcome::Unchanged);
        };
        let source = draft.unwrap_or(&line.text);
        let (first, second) = split_text(source, offset).ok_or_else(empty_split_error)?;
        let (first_tc, second_tc) = timecode.split();

        let before = self.store.clone();
        self.store.replace_range(
            index,
            1,
            vec![SubtitleLine::new(first), SubtitleLine::new(second)],
            vec![first_tc, second_tc],
        )?;
        self.history.record(before);
        self.state = EngineState::SplitInProgress;

        Ok(EditOutcome::Applied {
            focus: Some(EditFocus {
                target: EditTarget::Line(index + 1),
                cursor: 0,
            }),
        })
    }

    pub fn merge_with_previous(&mut self, index: usize, draft: Option<&str>) -> Result<EditOutcome> {
        if index == 0 || index >= self.store.len() {
            return Ok(EditOutcome::Unchanged);
        }
        self.merge_at(index - 1, draft, false)
    }

    pub fn merge_with_next(&mut self, index: usize, draft: Option<&str>) -> Result<EditOutcome> {
        if index + 1 >= self.store.len() {
            return Ok(EditOutcome::Unchanged);
        }
        self.merge_at(index, draft, true)
    }

    /// Слить строки `left` и `left + 1`: начало берётся у ранней строки,
    /// конец у поздней
    fn merge_at(&mut self, left: usize, draft: Option<&str>, draft_is_left: bool) -> Result<EditOutcome> {
        let (Some((left_line, left_tc)), Some((right_line, right_tc))) =
            (self.store.get(left), self.store.get(left + 1))
        else {
            return Ok(EditOutcome::Unchanged);
        };

        let (left_text, right_text) = match (draft, draft_is_left) {
            (Some(text), true) => (text, right_line.text.as_str()),
            (Some(text), false) => (left_line.text.as_str(), text),
            (None, _) => (left_line.text.as_str(), right_line.text.as_str()),
        };
        let (text, cursor) = join_texts(left_text, right_text);
        let timecode = left_tc.merge(right_tc);

        let before = self.store.clone();
        self.store
            .replace_range(left, 2, vec![SubtitleLine::new(text)], vec![timecode])?;
        self.history.record(before);
        self.state = EngineState::MergeInProgress;

        Ok(EditOutcome::Applied {
            focus: Some(EditFocus {
                target: EditTarget::Line(left),
                cursor,
            }),
        })
    }

    pub fn replace_text(&mut self, index: usize, text: &str) -> EditOutcome {
        let text = text.trim();
        if text.is_empty() {
            return EditOutcome::Unchanged;
        }
        match self.store.get(index) {
            Some((line, _)) if line.text != text => {}
            _ => return EditOutcome::Unchanged,
        }

        self.history.record(self.store.clone());
        self.store.set_text(index, text.to_string());
        EditOutcome::Applied { focus: None }
    }

    pub fn commit_edit(&mut self, index: usize, text: &str) -> EditOutcome {
        if !self.state.accepts_commit() {
            log::debug!("Commit for subtitle line {} suppressed while {:?}", index, self.state);
            return EditOutcome::Unchanged;
        }
        self.replace_text(index, text)
    }

    pub fn undo(&mut self) -> bool {
        let current = self.store.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.store = previous;
                self.state = EngineState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.store.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.store = next;
                self.state = EngineState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.store.clear();
        self.history.clear();
        self.state = EngineState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;
    use bytes::Bytes;
    use super::*;
    use crate::clip::ClipStatus;
    use crate::media::AudioPayload;

    fn narration(texts: &[&str]) -> NarrationEditor {
        let mut editor = NarrationEditor::new(20, 10);
        editor.load(texts.iter().copied());
        editor
    }

    /// Отметить клип как синтезированный и положить его аудио в кэш
    fn synthesize(editor: &mut NarrationEditor, index: usize) -> ClipId {
        let clip = &mut editor.clips_mut().clips_mut()[index];
        clip.audio = Some(PathBuf::from(format!("/tmp/clip_{}.wav", index)));
        clip.duration = Some(1.0);
        clip.status = ClipStatus::Done;
        let id = clip.id;
        editor
            .cache_mut()
            .insert(id, AudioPayload::new("/tmp/a.wav", Bytes::from_static(b"RIFF"), Some(1.0)));
        id
    }

    #[test]
    fn test_split_clears_audio_and_keeps_neighbours() {
        let mut editor = narration(&["Hello.", "World."]);
        let hello = synthesize(&mut editor, 0);
        let world = synthesize(&mut editor, 1);

        let outcome = editor.split(hello, 3, None).unwrap();
        let clips = editor.clips().clips();
        assert_eq!(editor.clips().texts(), vec!["Hel", "lo.", "World."]);
        assert!(!clips[0].has_audio());
        assert!(!clips[1].has_audio());
        assert_eq!(clips[2].id, world);
        assert!(clips[2].has_audio());
        assert!(!editor.cache().contains(hello));
        assert!(editor.cache().contains(world));

        let focus = outcome.focus().unwrap();
        assert_eq!(focus.target, EditTarget::Clip(clips[1].id));
        assert_eq!(focus.cursor, 0);
        assert_eq!(editor.state(), EngineState::SplitInProgress);
    }

    #[test]
    fn test_split_uses_draft_and_trims() {
        let mut editor = narration(&["original"]);
        let id = editor.clips().clips()[0].id;
        editor.split(id, 6, Some("First. Second.")).unwrap();
        assert_eq!(editor.clips().texts(), vec!["First.", "Second."]);
    }

    #[test]
    fn test_split_rejects_empty_part_without_change() {
        let mut editor = narration(&["Hello.  "]);
        let id = editor.clips().clips()[0].id;

        for offset in [0, 6, 7, 42] {
            assert!(editor.split(id, offset, None).is_err());
        }
        assert_eq!(editor.clips().ids(), vec![id]);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_split_counts_chars() {
        let mut editor = narration(&["안녕하세요. 반갑습니다."]);
        let id = editor.clips().clips()[0].id;
        editor.split(id, 6, None).unwrap();
        assert_eq!(editor.clips().texts(), vec!["안녕하세요.", "반갑습니다."]);
    }

    #[test]
    fn test_merge_with_next_reports_join_point() {
        let mut editor = narration(&["Hel", "World."]);
        let first = synthesize(&mut editor, 0);
        let second = synthesize(&mut editor, 1);

        let outcome = editor.merge_with_next(first, None).unwrap();
        assert_eq!(editor.clips().texts(), vec!["Hel World."]);
        let merged = &editor.clips().clips()[0];
        assert!(!merged.has_audio());
        assert_eq!(merged.status, ClipStatus::Pending);
        assert_eq!(outcome.focus().unwrap().cursor, 4);
        assert!(!editor.cache().contains(first));
        assert!(!editor.cache().contains(second));
    }

    #[test]
    fn test_merge_with_previous_uses_draft_of_current() {
        let mut editor = narration(&["One.", "Two.", "Three."]);
        let two = editor.clips().clips()[1].id;

        let outcome = editor.merge_with_previous(two, Some("  Two edited. ")).unwrap();
        assert_eq!(editor.clips().texts(), vec!["One. Two edited.", "Three."]);
        assert_eq!(outcome.focus().unwrap().cursor, 5);
        assert_eq!(editor.state(), EngineState::MergeInProgress);
    }

    #[test]
    fn test_merge_at_edges_is_noop() {
        let mut editor = narration(&["One.", "Two."]);
        let ids = editor.clips().ids();
        assert_eq!(editor.merge_with_previous(ids[0], None).unwrap(), EditOutcome::Unchanged);
        assert_eq!(editor.merge_with_next(ids[1], None).unwrap(), EditOutcome::Unchanged);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_split_then_merge_round_trip() {
        let mut editor = narration(&["The quick brown fox."]);
        let id = editor.clips().clips()[0].id;
        editor.split(id, 9, None).unwrap();
        let first = editor.clips().clips()[0].id;
        editor.merge_with_next(first, None).unwrap();
        assert_eq!(editor.clips().texts(), vec!["The quick brown fox."]);
    }

    #[test]
    fn test_identities_are_never_reused() {
        let mut editor = narration(&["A b c.", "D e f.", "G h i."]);
        let mut minted: HashSet<ClipId> = editor.clips().ids().into_iter().collect();
        let mut retired: HashSet<ClipId> = HashSet::new();

        for step in 0..12 {
            let before: HashSet<ClipId> = editor.clips().ids().into_iter().collect();
            let ids = editor.clips().ids();
            let target = ids[step % ids.len()];
            let _ = if step % 3 == 0 {
                editor.merge_with_next(target, None)
            } else {
                editor.split(target, 2, None)
            };
            let after: HashSet<ClipId> = editor.clips().ids().into_iter().collect();

            for id in before.difference(&after) {
                retired.insert(*id);
            }
            for id in after.difference(&before) {
                assert!(minted.insert(*id), "identity minted twice");
            }
            assert!(after.is_disjoint(&retired));
            assert_eq!(after.len(), editor.clips().len());
        }
    }

    #[test]
    fn test_replace_text_marks_edited() {
        let mut editor = narration(&["Hello."]);
        let id = synthesize(&mut editor, 0);

        assert_eq!(editor.replace_text(id, "  "), EditOutcome::Unchanged);
        assert_eq!(editor.replace_text(id, " Hello. "), EditOutcome::Unchanged);
        assert!(!editor.history().can_undo());

        assert!(editor.replace_text(id, "Goodbye.").is_applied());
        let clip = editor.clips().find(id).unwrap();
        assert_eq!(clip.text, "Goodbye.");
        assert_eq!(clip.status, ClipStatus::Edited);
        assert!(!clip.has_audio());
        assert!(!editor.cache().contains(id));
    }

    #[test]
    fn test_commit_suppressed_until_edit_begins() {
        let mut editor = narration(&["One.", "Two."]);
        let ids = editor.clips().ids();
        editor.merge_with_next(ids[0], None).unwrap();
        let merged = editor.clips().clips()[0].id;

        // запоздалая фиксация из закрытого редактора
        assert_eq!(editor.commit_edit(merged, "stale text"), EditOutcome::Unchanged);
        assert_eq!(editor.clips().texts(), vec!["One. Two."]);

        editor.begin_edit();
        assert!(editor.commit_edit(merged, "One, two.").is_applied());
    }

    #[test]
    fn test_undo_redo_restores_sequences_and_clears_cache() {
        let mut editor = narration(&["Hello.", "World."]);
        let hello = synthesize(&mut editor, 0);
        let world = synthesize(&mut editor, 1);
        editor.split(hello, 3, None).unwrap();

        assert!(editor.undo());
        assert_eq!(editor.clips().texts(), vec!["Hello.", "World."]);
        assert_eq!(editor.clips().ids(), vec![hello, world]);
        assert!(editor.clips().clips()[0].has_audio());
        assert!(editor.cache().is_empty());

        assert!(editor.redo());
        assert_eq!(editor.clips().texts(), vec!["Hel", "lo.", "World."]);
        assert!(!editor.redo());
    }

    #[test]
    fn test_subtitle_split_keeps_outer_timecodes() {
        let mut editor = SubtitleEditor::new(20);
        editor.load("Good morning everyone\nSecond").unwrap();
        editor.set_timecodes(vec![
            Timecode::new(Timestamp::from_millis(1_000), Timestamp::from_millis(4_000)),
            Timecode::new(Timestamp::from_millis(4_000), Timestamp::from_millis(6_000)),
        ]);

        let outcome = editor.split(0, 12, None).unwrap();
        assert_eq!(editor.store().texts(), vec!["Good morning", "everyone", "Second"]);
        let tcs = editor.store().timecodes();
        assert_eq!(tcs[0].start.as_millis(), 1_000);
        assert!(tcs[0].end.is_zero());
        assert!(tcs[1].start.is_zero());
        assert_eq!(tcs[1].end.as_millis(), 4_000);
        assert_eq!(outcome.focus().unwrap().target, EditTarget::Line(1));
    }

    #[test]
    fn test_subtitle_merge_spans_both_timecodes() {
        let mut editor = SubtitleEditor::new(20);
        editor.load("one\ntwo\nthree").unwrap();
        editor.set_timecodes(vec![
            Timecode::new(Timestamp::from_millis(0), Timestamp::from_millis(900)),
            Timecode::new(Timestamp::from_millis(1_000), Timestamp::from_millis(1_800)),
            Timecode::new(Timestamp::from_millis(2_000), Timestamp::from_millis(2_500)),
        ]);

        let outcome = editor.merge_with_previous(2, None).unwrap();
        assert_eq!(editor.store().texts(), vec!["one", "two three"]);
        let merged = editor.store().timecodes()[1];
        assert_eq!(merged.start.as_millis(), 1_000);
        assert_eq!(merged.end.as_millis(), 2_500);
        assert_eq!(
            outcome.focus(),
            Some(EditFocus { target: EditTarget::Line(1), cursor: 4 })
        );

        assert!(editor.undo());
        assert_eq!(editor.store().len(), 3);
        assert_eq!(editor.store().timecodes()[2].end.as_millis(), 2_500);
    }

    #[test]
    fn test_subtitle_replace_text_records_history() {
        let mut editor = SubtitleEditor::new(20);
        editor.load("alpha\nbeta").unwrap();
        assert!(editor.replace_text(1, "gamma").is_applied());
        assert_eq!(editor.store().texts(), vec!["alpha", "gamma"]);
        assert!(editor.undo());
        assert_eq!(editor.store().texts(), vec!["alpha", "beta"]);
    }
}
