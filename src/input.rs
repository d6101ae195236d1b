//! Привязки клавиш редактора
//!
//! Переводит нажатия клавиш в строке редактора в команды сессии. Позиции
//! курсора и выделения считаются в символах.

use crate::commands::{FocusMove, InputSource, StudioCommand};
use crate::edit::EditTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Буква с модификаторами (для сочетаний вроде Ctrl+Z)
    Char(char),
}

/// Нажатие клавиши в открытом редакторе
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorKey {
    pub key: Key,
    pub selection_start: usize,
    pub selection_end: usize,
    /// Текущий текст редактора
    pub text: String,
}

impl EditorKey {
    pub fn new(key: Key, text: impl Into<String>, cursor: usize) -> Self {
        Self {
            key,
            selection_start: cursor,
            selection_end: cursor,
            text: text.into(),
        }
    }

    pub fn with_selection(mut self, start: usize, end: usize) -> Self {
        self.selection_start = start;
        self.selection_end = end;
        self
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn at_start(&self) -> bool {
        self.selection_start == 0 && self.selection_end == 0
    }

    fn at_end(&self) -> bool {
        self.selection_start == self.len()
    }
}

/// Положение редактируемого элемента в списке
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPosition {
    pub index: usize,
    pub len: usize,
}

impl ListPosition {
    fn has_previous(&self) -> bool {
        self.index > 0
    }

    fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }
}

/// Перевести нажатие в редакторе в команду. `None` - клавиша остаётся
/// редактору текста.
pub fn translate_key(event: &EditorKey, target: EditTarget, position: ListPosition) -> Option<StudioCommand> {
    let draft = || Some(event.text.clone());
    let move_to = |to: FocusMove| StudioCommand::MoveFocus {
        target,
        text: event.text.clone(),
        to,
    };

    match event.key {
        Key::Enter => {
            let cursor = event.selection_start;
            if cursor > 0 && cursor < event.len() {
                Some(StudioCommand::Split {
                    target,
                    offset: cursor,
                    draft: draft(),
                })
            } else {
                Some(StudioCommand::CommitEdit {
                    target,
                    text: event.text.clone(),
                })
            }
        }
        Key::Escape => Some(StudioCommand::CancelEdit),
        Key::Backspace if event.at_start() && position.has_previous() => {
            Some(StudioCommand::MergeWithPrevious { target, draft: draft() })
        }
        Key::Delete if event.at_end() && position.has_next() => {
            Some(StudioCommand::MergeWithNext { target, draft: draft() })
        }
        Key::ArrowUp if position.has_previous() => Some(move_to(FocusMove::PreviousEnd)),
        Key::ArrowDown if position.has_next() => Some(move_to(FocusMove::NextStart)),
        Key::ArrowLeft if event.at_start() && position.has_previous() => Some(move_to(FocusMove::PreviousEnd)),
        Key::ArrowRight if event.at_end() && position.has_next() => Some(move_to(FocusMove::NextStart)),
        _ => None,
    }
}

/// Глобальные сочетания клавиш: Ctrl+Z - отмена, Ctrl+Shift+Z - повтор
pub fn translate_shortcut(key: Key, ctrl: bool, shift: bool) -> Option<StudioCommand> {
    match key {
        Key::Char(c) if ctrl && c.eq_ignore_ascii_case(&'z') => {
            if shift {
                Some(StudioCommand::Redo(InputSource::Keyboard))
            } else {
                Some(StudioCommand::Undo(InputSource::Keyboard))
            }
        }
        _ => None,
    }
}
