//! Light phase value type

use serde::{Deserialize, Serialize};

/// One of the two phases a traffic light can show.
///
/// Lights start in [`LightPhase::Red`] and alternate strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum LightPhase {
    /// Stop.
    #[default]
    Red,
    /// Go.
    Green,
}

impl LightPhase {
    /// Returns the phase that follows this one.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    /// Returns `true` for [`LightPhase::Green`].
    #[must_use]
    pub const fn is_green(self) -> bool {
        matches!(self, Self::Green)
    }

    /// Compact encoding used for atomic storage: `Red = 0`, `Green = 1`.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
        }
    }

    /// Decodes [`as_u8`](Self::as_u8). Only the low bit is significant.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        if value & 1 == 0 { Self::Red } else { Self::Green }
    }

    /// Lowercase name, as used in logs, metrics labels and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl std::fmt::Display for LightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
