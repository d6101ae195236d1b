//! Временные метки субтитров в формате `HH:MM:SS,mmm`

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::StudioError;

lazy_static! {
    static ref STRICT_TIMESTAMP: Regex =
        Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})$").expect("valid timestamp regex");
    static ref NON_TIMECODE_CHARS: Regex = Regex::new(r"[^0-9:,.]").expect("valid filter regex");
}

/// Временная метка с точностью до миллисекунды
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(u64);

impl Timestamp {
    /// Нулевая метка; также служит признаком "не задано"
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self((seconds.max(0.0) * 1000.0).round() as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `None`, если метка не помещается в `u64` миллисекунд
    fn from_parts(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Self> {
        let total = hours
            .checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1000)?
            .checked_add(millis)?;
        Some(Self(total))
    }

    /// Привести свободный ввод пользователя к метке.
    ///
    /// Посторонние символы отбрасываются, части разделяются `:`, `,` или `.`:
    /// `S`, `S,mmm`, `M:S`, `M:S,mmm`, `H:M:S`, `H:M:S,mmm`. Переполнение
    /// секунд переносится в минуты, минут в часы. Пустой ввод и слишком
    /// большие числа дают `None`.
    pub fn normalize_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value = NON_TIMECODE_CHARS.replace_all(trimmed, "");
        let has_fraction = value.contains(',') || value.contains('.');
        let parts: Vec<&str> = value.split(|c| c == ':' || c == ',' || c == '.').collect();

        // пустая часть считается нулём, число вне u64 отвергается
        let int = |s: &str| if s.is_empty() { Some(0) } else { s.parse::<u64>().ok() };
        let millis = |s: &str| {
            let digits: String = s.chars().chain(std::iter::repeat('0')).take(3).collect();
            int(&digits)
        };

        let (hours, minutes, seconds, ms) = match parts.as_slice() {
            [s] => (0, 0, int(s)?, 0),
            [s, frac] if has_fraction => (0, 0, int(s)?, millis(frac)?),
            [m, s] => (0, int(m)?, int(s)?, 0),
            [m, s, frac] if has_fraction => (0, int(m)?, int(s)?, millis(frac)?),
            [h, m, s] => (int(h)?, int(m)?, int(s)?, 0),
            [h, m, s, frac, ..] => (int(h)?, int(m)?, int(s)?, millis(frac)?),
            [] => (0, 0, 0, 0),
        };

        let timestamp = Self::from_parts(hours, minutes, seconds, ms);
        if timestamp.is_none() {
            log::debug!("Timestamp input {:?} is out of range", input);
        }
        timestamp
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0 % 1000;
        let total_seconds = self.0 / 1000;
        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = total_seconds / 3600;
        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl FromStr for Timestamp {
    type Err = StudioError;

    /// Строгий разбор `HH:MM:SS,mmm` (допускается `.` вместо запятой)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = STRICT_TIMESTAMP
            .captures(s.trim())
            .ok_or_else(|| StudioError::InvalidFormat(format!("invalid timestamp: {:?}", s)))?;

        let out_of_range = || StudioError::InvalidFormat(format!("timestamp field out of range: {:?}", s));
        let field = |i: usize| captures[i].parse::<u64>().map_err(|_| out_of_range());
        let millis = match captures[4].len() {
            1 => field(4)? * 100,
            2 => field(4)? * 10,
            _ => field(4)?,
        };
        let (minutes, seconds) = (field(2)?, field(3)?);
        if minutes >= 60 || seconds >= 60 {
            return Err(out_of_range());
        }
        Self::from_parts(field(1)?, minutes, seconds, millis).ok_or_else(out_of_range)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}

/// Начало и конец субтитра
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Timecode {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Пустой таймкод (обе метки нулевые)
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.start.is_zero() && self.end.is_zero()
    }

    /// Разделить таймкод: первой половине достаётся начало, второй конец,
    /// внутренняя граница остаётся нулевой до повторной генерации.
    pub fn split(&self) -> (Timecode, Timecode) {
        (
            Timecode::new(self.start, Timestamp::ZERO),
            Timecode::new(Timestamp::ZERO, self.end),
        )
    }

    /// Объединить с последующим таймкодом
    pub fn merge(&self, later: &Timecode) -> Timecode {
        Timecode::new(self.start, later.end)
    }
}

/// Какая из меток таймкода редактируется
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeEdge {
    Start,
    End,
}
