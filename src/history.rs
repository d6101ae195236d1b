//! История правок (undo/redo)
//!
//! Каждый слот хранит состояние "по другую сторону" от текущего: перед
//! правкой туда кладётся состояние до неё, при отмене слот обменивается с
//! текущим состоянием и начинает хранить состояние после правки. Так одна
//! и та же запись служит и для undo, и для redo.

use crate::clip::Clip;
use crate::subtitle::SubtitleStore;

/// Снимок режима озвучки: клипы вместе со ссылками на аудио
pub type NarrationSnapshot = Vec<Clip>;

/// Снимок режима субтитров: строки и таймкоды
pub type SubtitleSnapshot = SubtitleStore;

/// Ограниченная история снимков одного режима
#[derive(Debug, Clone)]
pub struct History<S> {
    entries: Vec<S>,
    /// Число записей, доступных для отмены; записи правее - для повтора
    cursor: usize,
    capacity: usize,
}

impl<S: Clone> History<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Запомнить состояние перед правкой. Ветка повтора отбрасывается,
    /// самая старая запись вытесняется при переполнении.
    pub fn record(&mut self, before: S) {
        self.entries.truncate(self.cursor);
        self.entries.push(before);
        self.cursor += 1;

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
        }
        log::debug!("History saved: {}/{}", self.cursor, self.entries.len());
    }

    /// Отменить правку. `current` - текущее состояние; возвращается
    /// состояние, которое нужно восстановить.
    pub fn undo(&mut self, current: S) -> Option<S> {
        if self.cursor == 0 {
            log::debug!("Nothing to undo");
            return None;
        }
        self.cursor -= 1;
        let restored = std::mem::replace(&mut self.entries[self.cursor], current);
        log::debug!("Undo: {}/{}", self.cursor, self.entries.len());
        Some(restored)
    }

    /// Повторить отменённую правку
    pub fn redo(&mut self, current: S) -> Option<S> {
        if self.cursor >= self.entries.len() {
            log::debug!("Nothing to redo");
            return None;
        }
        let restored = std::mem::replace(&mut self.entries[self.cursor], current);
        self.cursor += 1;
        log::debug!("Redo: {}/{}", self.cursor, self.entries.len());
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_len(&self) -> usize {
        self.cursor
    }

    pub fn redo_len(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Общее число хранимых записей
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
