//! Команды сессии
//!
//! Каждое действие пользователя выражается как `StudioCommand`. Адаптер
//! интерфейса (см. `input`) переводит события клавиатуры и кнопок в команды,
//! `Session::dispatch` применяет их к состоянию.

use serde::{Deserialize, Serialize};
use crate::clip::ClipId;
use crate::edit::{EditFocus, EditOutcome, EditTarget};
use crate::subtitle::TimecodeEdge;

/// Активный режим работы
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workflow {
    #[default]
    Narration,
    Subtitles,
}

/// Откуда пришла команда отмены/повтора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// Сочетание клавиш; игнорируется, пока открыт редактор текста
    Keyboard,
    /// Кнопка панели инструментов
    Toolbar,
}

/// Куда перевести фокус после фиксации текста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusMove {
    /// Конец предыдущего элемента
    PreviousEnd,
    /// Начало следующего элемента
    NextStart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudioCommand {
    // ── Режим ─────────────────────────────────────────────────────────────
    SwitchWorkflow(Workflow),

    // ── Редактирование ────────────────────────────────────────────────────
    /// Открыть редактор на элементе с курсором в заданной позиции
    BeginEdit { target: EditTarget, cursor: usize },
    /// Зафиксировать текст редактора. Игнорируется, пока структурная правка
    /// не осела.
    CommitEdit { target: EditTarget, text: String },
    CancelEdit,
    /// `draft` - несохранённый текст редактора, если он отличается от клипа
    Split { target: EditTarget, offset: usize, draft: Option<String> },
    MergeWithPrevious { target: EditTarget, draft: Option<String> },
    MergeWithNext { target: EditTarget, draft: Option<String> },
    /// Зафиксировать текст и перейти к соседнему элементу
    MoveFocus { target: EditTarget, text: String, to: FocusMove },
    SetTimestamp { index: usize, edge: TimecodeEdge, input: String },
    Undo(InputSource),
    Redo(InputSource),

    // ── Воспроизведение ───────────────────────────────────────────────────
    Audition(ClipId),
    PlayAll,
    PlayFrom(usize),
    PlayerPrev,
    PlayerNext,
    PlayerToggle,
    /// Позиция в долях длительности текущего клипа
    Seek(f64),
    SetSpeed(f32),
    StopPlayback,
    ClosePlayer,

    // ── Прочее ────────────────────────────────────────────────────────────
    StopSynthesis,
    Reset,
}

/// Результат команды
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Состояние изменилось; `focus` - куда перевести редактор
    Applied { focus: Option<EditFocus> },
    /// Команда принята, но менять было нечего
    Unchanged,
    /// Команда подавлена в текущем состоянии
    Ignored,
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }

    pub fn focus(&self) -> Option<EditFocus> {
        match self {
            CommandOutcome::Applied { focus } => *focus,
            _ => None,
        }
    }

    pub(crate) fn from_flag(changed: bool) -> Self {
        if changed {
            CommandOutcome::Applied { focus: None }
        } else {
            CommandOutcome::Unchanged
        }
    }
}

impl From<EditOutcome> for CommandOutcome {
    fn from(outcome: EditOutcome) -> Self {
        match outcome {
            EditOutcome::Applied { focus } => CommandOutcome::Applied { focus },
            EditOutcome::Unchanged => CommandOutcome::Unchanged,
        }
    }
}
