//! Memory pressure levels reported by the platform

use serde::{Deserialize, Serialize};

/// Ordered from mildest to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemoryLevel {
    RunningModerate,
    RunningLow,
    RunningCritical,
    UiHidden,
    Background,
    Moderate,
    Complete,
}

impl MemoryLevel {
    /// Map a platform trim level onto a memory level
    pub fn from_trim_level(level: i32) -> Option<Self> {
        match level {
            5 => Some(MemoryLevel::RunningModerate),
            10 => Some(MemoryLevel::RunningLow),
            15 => Some(MemoryLevel::RunningCritical),
            20 => Some(MemoryLevel::UiHidden),
            40 => Some(MemoryLevel::Background),
            60 => Some(MemoryLevel::Moderate),
            80 => Some(MemoryLevel::Complete),
            _ => None,
        }
    }

    pub fn trim_level(&self) -> i32 {
        match self {
            MemoryLevel::RunningModerate => 5,
            MemoryLevel::RunningLow => 10,
            MemoryLevel::RunningCritical => 15,
            MemoryLevel::UiHidden => 20,
            MemoryLevel::Background => 40,
            MemoryLevel::Moderate => 60,
            MemoryLevel::Complete => 80,
        }
    }

    /// Whether background tabs should give up their engine state
    pub fn is_critical(&self) -> bool {
        matches!(self, MemoryLevel::RunningCritical | MemoryLevel::Complete)
    }

    /// UI-hidden and moderate-while-running are informational only
    pub fn should_trim_background(&self) -> bool {
        !matches!(self, MemoryLevel::RunningModerate | MemoryLevel::UiHidden)
    }
}

impl std::fmt::Display for MemoryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.trim_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_level_mapping() {
        for level in [5, 10, 15, 20, 40, 60, 80] {
            let memory_level = MemoryLevel::from_trim_level(level).unwrap();
            assert_eq!(memory_level.trim_level(), level);
        }
        assert_eq!(MemoryLevel::from_trim_level(7), None);
    }

    #[test]
    fn test_severity() {
        assert!(MemoryLevel::Complete.is_critical());
        assert!(MemoryLevel::RunningCritical.is_critical());
        assert!(!MemoryLevel::Background.is_critical());

        assert!(!MemoryLevel::UiHidden.should_trim_background());
        assert!(MemoryLevel::RunningLow.should_trim_background());
        assert!(MemoryLevel::RunningModerate < MemoryLevel::Complete);
    }
}
