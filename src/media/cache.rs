//! Модуль для кэширования загруженного аудио
//!
//! Кэш ограничен по числу записей и вытесняет запись, к которой дольше всего
//! не обращались. Записи носят рекомендательный характер: промах кэша лишь
//! приводит к повторной загрузке файла.

use std::collections::HashMap;
use crate::clip::ClipId;
use crate::media::audio::AudioPayload;

/// Запись кэша
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: AudioPayload,
    last_used: u64,
}

/// LRU кэш аудио по идентификатору клипа
#[derive(Debug, Clone)]
pub struct AudioCache {
    capacity: usize,
    entries: HashMap<ClipId, CacheEntry>,
    /// Монотонный счётчик обращений
    clock: u64,
}

impl AudioCache {
    /// Создать кэш указанной ёмкости (не меньше 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Получить аудио и отметить обращение
    pub fn get(&mut self, id: ClipId) -> Option<AudioPayload> {
        let now = self.tick();
        let entry = self.entries.get_mut(&id)?;
        entry.last_used = now;
        Some(entry.payload.clone())
    }

    /// Положить аудио в кэш. Возвращает вытесненный идентификатор, если был.
    pub fn insert(&mut self, id: ClipId, payload: AudioPayload) -> Option<ClipId> {
        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.payload = payload;
            entry.last_used = now;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
                log::debug!("Audio cache evicted clip {}", oldest);
            }
            oldest
        } else {
            None
        };

        self.entries.insert(id, CacheEntry { payload, last_used: now });
        evicted
    }

    /// Удалить запись клипа
    pub fn invalidate(&mut self, id: ClipId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Очистить кэш полностью
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Есть ли запись (без отметки обращения)
    pub fn contains(&self, id: ClipId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
