pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::{collections::HashMap, fmt::Display, ops::Range};

pub use crate::config::*;

// **** Vote storage ****

/// The votes recorded so far, by catalog index.
///
/// Invariant: every key is a valid index for a catalog of `catalog_len`
/// items.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteStore {
    catalog_len: usize,
    votes: HashMap<usize, Vote>,
}

impl VoteStore {
    pub fn new(catalog_len: usize) -> VoteStore {
        VoteStore {
            catalog_len,
            votes: HashMap::new(),
        }
    }

    /// Toggles a vote on an item.
    ///
    /// Casting the vote already recorded removes it. Casting the opposite vote
    /// replaces it directly, there is no need to unvote first.
    ///
    /// Returns the vote recorded for this item after the call.
    pub fn toggle_vote(&mut self, index: usize, vote: Vote) -> Result<Option<Vote>, SurveyErrors> {
        if index >= self.catalog_len {
            return Err(SurveyErrors::InvalidVoteTarget {
                index,
                catalog_len: self.catalog_len,
            });
        }
        if self.votes.get(&index) == Some(&vote) {
            self.votes.remove(&index);
            debug!("toggle_vote: {}: unvoted", index);
            Ok(None)
        } else {
            let previous = self.votes.insert(index, vote);
            debug!("toggle_vote: {}: {:?} -> {:?}", index, previous, vote);
            Ok(Some(vote))
        }
    }

    pub fn has(&self, index: usize) -> bool {
        self.votes.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<Vote> {
        self.votes.get(&index).cloned()
    }

    /// The number of items with a vote.
    pub fn count(&self) -> usize {
        self.votes.len()
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog_len
    }
}

// **** Batches ****

/// The bounds `[start, end)` of a batch of items.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct BatchWindow {
    pub start: usize,
    pub end: usize,
}

impl BatchWindow {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

impl Display for BatchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Walks through the catalog one fixed-size batch at a time.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BatchController {
    batch_index: usize,
    batch_size: usize,
    catalog_len: usize,
}

impl BatchController {
    pub fn new(batch_size: usize, catalog_len: usize) -> Result<BatchController, SurveyErrors> {
        if batch_size == 0 {
            return Err(SurveyErrors::InvalidBatchSize);
        }
        Ok(BatchController {
            batch_index: 0,
            batch_size,
            catalog_len,
        })
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The total number of batches in the catalog.
    pub fn batch_count(&self) -> usize {
        self.catalog_len / self.batch_size + usize::from(self.catalog_len % self.batch_size != 0)
    }

    /// The active batch, or None once all the batches were submitted.
    ///
    /// The window is never empty.
    pub fn current_window(&self) -> Option<BatchWindow> {
        if self.is_finished() {
            return None;
        }
        let start = self.batch_index * self.batch_size;
        let end = start.saturating_add(self.batch_size).min(self.catalog_len);
        Some(BatchWindow { start, end })
    }

    /// The indices of the active batch that have no vote yet.
    pub fn missing_votes(&self, store: &VoteStore) -> Vec<usize> {
        match self.current_window() {
            Some(w) => w.range().filter(|idx| !store.has(*idx)).collect(),
            None => Vec::new(),
        }
    }

    /// True if every item of the active batch has a vote.
    ///
    /// Only the active batch is looked at: votes elsewhere in the catalog do
    /// not count.
    pub fn is_window_complete(&self, store: &VoteStore) -> bool {
        match self.current_window() {
            Some(w) => w.range().all(|idx| store.has(idx)),
            None => false,
        }
    }

    /// Moves to the next batch.
    ///
    /// Fails without changing anything if the active batch is not fully rated.
    pub fn advance(&mut self, store: &VoteStore) -> Result<(), SurveyErrors> {
        let window = self.current_window().ok_or(SurveyErrors::NotRating)?;
        let missing = self.missing_votes(store);
        if !missing.is_empty() {
            debug!("advance: batch {} incomplete: {:?}", window, missing);
            return Err(SurveyErrors::IncompleteBatch {
                start: window.start,
                end: window.end,
                missing,
            });
        }
        self.batch_index += 1;
        debug!("advance: batch {} done, now at batch {}", window, self.batch_index);
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.batch_index >= self.batch_count()
    }

    pub fn reset(&mut self) {
        self.batch_index = 0;
    }
}

// **** Aggregation ****

/// Computes the tallies per category.
///
/// Every item is counted exactly once in the total of its category. The
/// categories appear in the order in which they are first seen in the catalog.
pub fn aggregate(items: &[Item], store: &VoteStore) -> SurveyResults {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(String, CategoryTally)> = Vec::new();
    for item in items.iter() {
        let label = item.category_label();
        let pos = *positions.entry(label).or_insert_with(|| {
            tallies.push((label.to_string(), CategoryTally::default()));
            tallies.len() - 1
        });
        let tally = &mut tallies[pos].1;
        tally.total += 1;
        match store.get(item.index) {
            Some(Vote::Upvote) => tally.upvotes += 1,
            Some(Vote::Downvote) => tally.downvotes += 1,
            None => {}
        }
    }
    debug!("aggregate: {} categories", tallies.len());
    SurveyResults { tallies }
}

/// A digest of the catalog content.
///
/// Two catalogs with the same items in the same order have the same
/// fingerprint.
pub fn catalog_fingerprint(items: &[Item]) -> String {
    let mut data = String::new();
    for item in items.iter() {
        data.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            item.index,
            item.title,
            item.author,
            item.category.as_deref().unwrap_or(""),
            item.period.as_deref().unwrap_or("")
        ));
    }
    sha256::digest(data.as_str())
}

// **** Survey ****

/// A survey in progress: the catalog, the votes and the position in the
/// catalog.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Survey {
    items: Vec<Item>,
    store: VoteStore,
    controller: BatchController,
}

impl Survey {
    /// Starts a survey over the given catalog.
    ///
    /// An empty catalog gives a survey that is already finished.
    pub fn new(items: Vec<Item>, rules: &SurveyRules) -> Result<Survey, SurveyErrors> {
        for (position, item) in items.iter().enumerate() {
            if item.index != position {
                return Err(SurveyErrors::MisnumberedItem {
                    position,
                    index: item.index,
                });
            }
        }
        let controller = BatchController::new(rules.batch_size, items.len())?;
        info!(
            "Starting survey: {} items in {} batches of {}",
            items.len(),
            controller.batch_count(),
            rules.batch_size
        );
        Ok(Survey {
            store: VoteStore::new(items.len()),
            items,
            controller,
        })
    }

    pub fn phase(&self) -> Phase {
        if self.controller.is_finished() {
            Phase::Finished
        } else {
            Phase::Rating
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn votes(&self) -> &VoteStore {
        &self.store
    }

    pub fn batches(&self) -> &BatchController {
        &self.controller
    }

    pub fn current_window(&self) -> Option<BatchWindow> {
        self.controller.current_window()
    }

    /// The items of the active batch (empty once finished).
    pub fn current_batch(&self) -> &[Item] {
        match self.current_window() {
            Some(w) => &self.items[w.range()],
            None => &[],
        }
    }

    pub fn toggle_vote(&mut self, index: usize, vote: Vote) -> Result<Option<Vote>, SurveyErrors> {
        if self.phase() != Phase::Rating {
            return Err(SurveyErrors::NotRating);
        }
        self.store.toggle_vote(index, vote)
    }

    /// Submits the active batch and returns the phase after the submission.
    pub fn submit(&mut self) -> Result<Phase, SurveyErrors> {
        self.controller.advance(&self.store)?;
        let phase = self.phase();
        if phase == Phase::Finished {
            info!("All {} items rated", self.items.len());
        }
        Ok(phase)
    }

    /// Clears all the votes and goes back to the first batch.
    ///
    /// Only available once the survey is finished.
    pub fn restart(&mut self) -> Result<(), SurveyErrors> {
        if self.phase() != Phase::Finished {
            return Err(SurveyErrors::NotFinished);
        }
        self.store.clear();
        self.controller.reset();
        info!("Survey restarted");
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            rated: self.store.count(),
            total: self.items.len(),
        }
    }

    pub fn results(&self) -> SurveyResults {
        aggregate(&self.items, &self.store)
    }

    pub fn fingerprint(&self) -> String {
        catalog_fingerprint(&self.items)
    }
}

// **** Session ****

/// Anything that can provide the catalog of a survey.
pub trait CatalogSource {
    type Error: Display;

    fn load_catalog(&self) -> Result<Vec<Item>, Self::Error>;
}

/// The whole life of a survey, including the loading of its catalog.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Session {
    Loading,
    Active(Survey),
    /// The catalog could not be loaded. There is no way out of this state.
    Failed(String),
}

impl Session {
    pub fn new() -> Session {
        Session::Loading
    }

    /// Loads the catalog. Only meaningful while loading: any other session is
    /// returned untouched.
    pub fn load<S: CatalogSource>(self, source: &S, rules: &SurveyRules) -> Session {
        match self {
            Session::Loading => {}
            other => {
                warn!("load: catalog already loaded, ignoring");
                return other;
            }
        }
        let items = match source.load_catalog() {
            Ok(items) => items,
            Err(e) => {
                warn!("load: failed to load the catalog: {}", e);
                return Session::Failed(e.to_string());
            }
        };
        match Survey::new(items, rules) {
            Ok(survey) => Session::Active(survey),
            Err(e) => {
                warn!("load: invalid catalog: {}", e);
                Session::Failed(e.to_string())
            }
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Session::Loading => Phase::Loading,
            Session::Active(survey) => survey.phase(),
            Session::Failed(_) => Phase::Error,
        }
    }

    pub fn survey(&self) -> Option<&Survey> {
        match self {
            Session::Active(survey) => Some(survey),
            _ => None,
        }
    }

    pub fn survey_mut(&mut self) -> Option<&mut Survey> {
        match self {
            Session::Active(survey) => Some(survey),
            _ => None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
