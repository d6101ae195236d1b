use serde::{Deserialize, Serialize};
use crate::error::{Result, StudioError};
use crate::subtitle::timecode::{Timecode, TimecodeEdge, Timestamp};

/// Строка субтитров; адресуется только позицией
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleLine {
    pub text: String,
}

impl SubtitleLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Строки субтитров и их таймкоды; длины списков всегда совпадают
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStore {
    lines: Vec<SubtitleLine>,
    timecodes: Vec<Timecode>,
}

impl SubtitleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Загрузить файл субтитров: одна непустая строка файла - одна строка
    /// субтитров, все таймкоды нулевые
    pub fn load(&mut self, content: &str) -> Result<usize> {
        let lines: Vec<SubtitleLine> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(SubtitleLine::new)
            .collect();

        if lines.is_empty() {
            return Err(StudioError::user_input("subtitle file is empty"));
        }

        self.timecodes = vec![Timecode::zero(); lines.len()];
        self.lines = lines;
        Ok(self.lines.len())
    }

    pub fn lines(&self) -> &[SubtitleLine] {
        &self.lines
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    pub fn timecodes(&self) -> &[Timecode] {
        &self.timecodes
    }

    pub fn get(&self, index: usize) -> Option<(&SubtitleLine, &Timecode)> {
        Some((self.lines.get(index)?, self.timecodes.get(index)?))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Есть ли хотя бы один ненулевой таймкод
    pub fn has_timecodes(&self) -> bool {
        self.timecodes.iter().any(|tc| !tc.is_zero())
    }

    /// Заменить таймкоды результатом выравнивания. Лишние отбрасываются,
    /// недостающие заполняются нулями.
    pub fn set_timecodes(&mut self, mut timecodes: Vec<Timecode>) {
        if timecodes.len() != self.lines.len() {
            log::warn!(
                "Aligner returned {} timecodes for {} subtitle lines",
                timecodes.len(),
                self.lines.len()
            );
            timecodes.resize(self.lines.len(), Timecode::zero());
        }
        self.timecodes = timecodes;
    }

    /// Задать одну метку по свободному вводу пользователя.
    /// Возвращает нормализованную метку либо `None`, если ввод пуст или строки нет.
    pub fn set_timestamp(&mut self, index: usize, edge: TimecodeEdge, input: &str) -> Option<Timestamp> {
        let timestamp = Timestamp::normalize_input(input)?;
        let timecode = self.timecodes.get_mut(index)?;
        match edge {
            TimecodeEdge::Start => timecode.start = timestamp,
            TimecodeEdge::End => timecode.end = timestamp,
        }
        Some(timestamp)
    }

    pub(crate) fn set_text(&mut self, index: usize, text: String) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.text = text;
                true
            }
            None => false,
        }
    }

    /// Позиционный аналог `ClipStore::replace_range` для строк и таймкодов
    pub(crate) fn replace_range(
        &mut self,
        start: usize,
        count: usize,
        lines: Vec<SubtitleLine>,
        timecodes: Vec<Timecode>,
    ) -> Result<()> {
        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.lines.len())
            .ok_or_else(|| StudioError::Other(format!("subtitle range {}+{} is out of bounds", start, count)))?;
        if lines.len() != timecodes.len() {
            return Err(StudioError::Other("subtitle lines and timecodes differ in length".to_string()));
        }

        self.lines.splice(start..end, lines);
        self.timecodes.splice(start..end, timecodes);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.timecodes.clear();
    }
}
