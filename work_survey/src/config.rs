// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The label used for the items that do not declare a category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// The two possible votes on an item.
///
/// There is no third "unset" state: an item without a vote simply has no
/// entry in the [crate::VoteStore].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Vote {
    Upvote,
    Downvote,
}

/// An entry of the catalog.
///
/// Items are immutable once the catalog is loaded. The index is the position
/// of the item in the catalog and stays stable for the whole session.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Item {
    pub index: usize,
    pub title: String,
    pub author: String,
    /// The grouping label (the school of philosophy in the default catalog).
    /// Missing or empty categories are reported under [UNKNOWN_CATEGORY].
    pub category: Option<String>,
    /// Free-form display period, for example "1781-1790".
    pub period: Option<String>,
}

impl Item {
    /// The label this item is aggregated under.
    ///
    /// Labels are taken literally: "Stoicism" and "stoicism " are two
    /// distinct categories.
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => UNKNOWN_CATEGORY,
        }
    }
}

// ******** Output data structures *********

/// Counts for a single category.
///
/// `total` counts all the items of the category, rated or not, so that
/// `upvotes + downvotes <= total` always holds.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CategoryTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub total: u64,
}

impl CategoryTally {
    pub fn unrated(&self) -> u64 {
        self.total - self.upvotes - self.downvotes
    }
}

/// The tallies of a survey, in order of first appearance of each category in
/// the catalog.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SurveyResults {
    pub tallies: Vec<(String, CategoryTally)>,
}

impl SurveyResults {
    pub fn get(&self, category: &str) -> Option<&CategoryTally> {
        self.tallies
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, t)| t)
    }

    /// The data handed to a chart: (category, number of upvotes) pairs, in a
    /// stable order.
    pub fn chart_rows(&self) -> Vec<(String, u64)> {
        self.tallies
            .iter()
            .map(|(name, t)| (name.clone(), t.upvotes))
            .collect()
    }

    pub fn total_items(&self) -> u64 {
        self.tallies.iter().map(|(_, t)| t.total).sum()
    }
}

/// How far the user is in the catalog.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Progress {
    pub rated: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.rated as f64) * 100.0 / (self.total as f64)
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.rated, self.total)
    }
}

/// The states of a survey session.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Phase {
    /// The catalog has not been loaded yet.
    Loading,
    /// Batches are being shown and rated.
    Rating,
    /// All the batches were submitted, results are available.
    Finished,
    /// The catalog could not be loaded. This state is terminal.
    Error,
}

/// Errors reported by the survey operations.
///
/// None of them leaves the survey in a modified state.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyErrors {
    /// A vote was attempted on an index outside of the catalog.
    InvalidVoteTarget { index: usize, catalog_len: usize },
    /// The current batch still has unrated items.
    IncompleteBatch {
        start: usize,
        end: usize,
        missing: Vec<usize>,
    },
    /// The operation requires the survey to be in the rating phase.
    NotRating,
    /// The operation requires the survey to be finished.
    NotFinished,
    /// Batches must contain at least one item.
    InvalidBatchSize,
    /// The item at this position does not carry the matching index.
    MisnumberedItem { position: usize, index: usize },
}

impl Error for SurveyErrors {}

impl Display for SurveyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyErrors::InvalidVoteTarget { index, catalog_len } => write!(
                f,
                "cannot vote on item {}: the catalog has {} items",
                index, catalog_len
            ),
            SurveyErrors::IncompleteBatch { missing, .. } => write!(
                f,
                "please rate all works before submitting ({} left in this batch)",
                missing.len()
            ),
            SurveyErrors::NotRating => write!(f, "the survey is not accepting votes"),
            SurveyErrors::NotFinished => write!(f, "the survey is not finished yet"),
            SurveyErrors::InvalidBatchSize => write!(f, "the batch size must be at least 1"),
            SurveyErrors::MisnumberedItem { position, index } => write!(
                f,
                "item at position {} is numbered {}",
                position, index
            ),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyRules {
    /// Number of items shown and submitted together.
    pub batch_size: usize,
}

impl SurveyRules {
    pub const DEFAULT_RULES: SurveyRules = SurveyRules { batch_size: 5 };
}
