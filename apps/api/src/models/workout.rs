use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed muscle-group categories the extraction prompt is constrained to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Biceps,
    Triceps,
    Abs,
    Cardio,
    #[default]
    Other,
    /// Read-side sentinel for rows logged before the muscle-group column existed.
    /// Never produced by the parser.
    Uncategorized,
}

impl MuscleGroup {
    /// Categories offered to the model, in prompt order.
    pub const PROMPT_CATEGORIES: [MuscleGroup; 9] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Legs,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Abs,
        MuscleGroup::Cardio,
        MuscleGroup::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Cardio => "Cardio",
            MuscleGroup::Other => "Other",
            MuscleGroup::Uncategorized => "Uncategorized",
        }
    }

    /// Case-insensitive lookup. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        [
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Legs,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Abs,
            MuscleGroup::Cardio,
            MuscleGroup::Other,
            MuscleGroup::Uncategorized,
        ]
        .into_iter()
        .find(|g| g.as_str().eq_ignore_ascii_case(label))
    }

    /// Like `from_label`, but only matches `PROMPT_CATEGORIES`.
    pub fn from_prompt_label(label: &str) -> Option<Self> {
        Self::from_label(label).filter(|g| Self::PROMPT_CATEGORIES.contains(g))
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One set extracted from a single submission, before it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub exercise: String,
    pub muscle_group: MuscleGroup,
    pub weight: f64,
    pub reps: u32,
    pub notes: String,
}

/// One row read back from the Log Store, with numeric columns coerced.
///
/// `None` means the cell was missing or not a number; such rows are skipped
/// by aggregates rather than counted as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub date: Option<NaiveDate>,
    pub exercise: String,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub notes: String,
    pub muscle_group: MuscleGroup,
}

/// Every row of the Log Store, in store order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogTable {
    pub rows: Vec<LoggedSet>,
}

impl LogTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
