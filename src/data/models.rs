//! Data models for runner profiles and their recorded runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::StoreError;

/// Distance in kilometers a run must cover to count as a finished marathon
pub const MARATHON_DISTANCE_KM: f64 = 42.195;

/// Maximum number of characters allowed in a runner's name
pub const NAME_MAX_CHARS: usize = 30;

/// A runner's gender, stored by ordinal index (0, 1, 2).
///
/// The variant order is part of the storage format: reordering variants
/// would silently remap every stored row. Do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Diverse,
}

impl Gender {
    /// Ordinal written to the `runner.gender` column
    pub fn ordinal(self) -> i64 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
            Gender::Diverse => 2,
        }
    }

    /// Decode a stored ordinal; `None` for values no variant maps to
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Gender::Male),
            1 => Some(Gender::Female),
            2 => Some(Gender::Diverse),
            _ => None,
        }
    }
}

/// A person profile that owns zero or more runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// `None` until the first insert assigns a row id; immutable afterward
    pub id: Option<i64>,
    pub name: String,
    pub gender: Gender,
    /// Runs owned by this runner, derived from the run table's foreign key.
    /// Populated only by [`Storage::find_runner`](super::Storage::find_runner);
    /// empty on runners returned by every other query.
    pub runs: Vec<Run>,
}

impl Runner {
    /// Create an unsaved runner (no id assigned yet)
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Runner {
            id: None,
            name: name.into(),
            gender,
            runs: Vec::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.name.chars().count() > NAME_MAX_CHARS {
            return Err(StoreError::Validation {
                field: "name",
                reason: format!("must be at most {NAME_MAX_CHARS} characters"),
            });
        }
        Ok(())
    }
}

/// Identity is the row id: two saved runners are equal iff their ids match,
/// regardless of other fields. Unsaved runners equal only themselves.
impl PartialEq for Runner {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.id.is_some() && self.id == other.id)
    }
}

impl Eq for Runner {}

impl std::hash::Hash for Runner {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A single recorded exercise session belonging to one runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// `None` until the insert assigns a row id
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub distance_km: f64,
    pub minutes: i64,
    /// The owning runner; a run cannot exist without one
    pub runner: Runner,
}

impl Run {
    /// Create an unsaved run for the given runner
    pub fn new(date: NaiveDate, distance_km: f64, minutes: i64, runner: Runner) -> Self {
        Run {
            id: None,
            date,
            distance_km,
            minutes,
            runner,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        // `>` is false for NaN as well
        if !(self.distance_km > 0.0) {
            return Err(StoreError::Validation {
                field: "distance_km",
                reason: "must be positive".to_string(),
            });
        }
        if self.minutes <= 0 {
            return Err(StoreError::Validation {
                field: "minutes",
                reason: "must be positive".to_string(),
            });
        }
        self.runner.validate()
    }
}

impl PartialEq for Run {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.id.is_some() && self.id == other.id)
    }
}

impl Eq for Run {}

impl std::hash::Hash for Run {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
