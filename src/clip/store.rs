use std::collections::HashSet;
use crate::clip::{Clip, ClipId};
use crate::error::{Result, StudioError};

/// Упорядоченный список клипов озвучки.
///
/// Единственный владелец идентичности и порядка клипов. Аудио кэш и история
/// только ссылаются на идентификаторы.
#[derive(Debug, Clone, Default)]
pub struct ClipStore {
    clips: Vec<Clip>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Заменить содержимое новыми клипами со свежими идентификаторами
    pub fn load<I, S>(&mut self, texts: I) -> &[Clip]
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clips = texts.into_iter().map(Clip::new).collect();
        &self.clips
    }

    pub fn get(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn find(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    pub fn find_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id == id)
    }

    /// Текущая позиция клипа (производное значение, не источник истины)
    pub fn position(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id == id)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Изменяемый доступ к клипам без права менять их состав
    pub(crate) fn clips_mut(&mut self) -> &mut [Clip] {
        &mut self.clips
    }

    pub fn ids(&self) -> Vec<ClipId> {
        self.clips.iter().map(|clip| clip.id).collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.clips.iter().map(|clip| clip.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Удалить `count` подряд идущих клипов начиная с `start` и вставить на их
    /// место `new_clips`. Возвращает удалённые клипы.
    ///
    /// Отказывает без изменений, если диапазон выходит за границы или новые
    /// клипы повторяют уже живой идентификатор.
    pub fn replace_range(&mut self, start: usize, count: usize, new_clips: Vec<Clip>) -> Result<Vec<Clip>> {
        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.clips.len())
            .ok_or_else(|| {
                StudioError::Other(format!(
                    "clip range {}+{} is outside a list of {}",
                    start,
                    count,
                    self.clips.len()
                ))
            })?;

        let mut seen: HashSet<ClipId> = self.clips[..start]
            .iter()
            .chain(self.clips[end..].iter())
            .map(|clip| clip.id)
            .collect();
        for clip in &new_clips {
            if !seen.insert(clip.id) {
                return Err(StudioError::Other(format!("duplicate clip identity {}", clip.id)));
            }
        }

        Ok(self.clips.splice(start..end, new_clips).collect())
    }

    /// Полная копия списка для истории
    pub fn snapshot(&self) -> Vec<Clip> {
        self.clips.clone()
    }

    /// Восстановить список из истории
    pub fn restore(&mut self, mut clips: Vec<Clip>) {
        for clip in &mut clips {
            clip.settle_status();
        }
        self.clips = clips;
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }
}
