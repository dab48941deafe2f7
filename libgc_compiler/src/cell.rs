use serde::Serialize;
use std::fmt;

/// A single cell of a result table.
///
/// Result tables are free text, so a cell is only ever interpreted as a number on demand. A
/// blank cell is `Missing`, anything that is a finite floating point number is `Number` and
/// everything else is kept verbatim as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Interpret a raw field. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// The numeric value, or None for text and missing cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as a channel number. Channels are whole numbers; `2.0` is channel 2, `2.5`
    /// is not a channel.
    pub fn as_channel(&self) -> Option<u32> {
        match self {
            Self::Number(value) if value.fract() == 0.0 && *value >= 0.0 => {
                u32::try_from(*value as u64).ok()
            }
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Missing => Ok(()),
        }
    }
}
