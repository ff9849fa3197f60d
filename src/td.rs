//! Episode traces and the TD(n) update pass.
//!
//! The learned value is an afterstate value: `V(after)` estimates the reward
//! still to be collected from the board right after a slide. A trace record
//! therefore carries the reward of the slide that *leaves* its afterstate.

use crate::constants::ISOMORPHISMS;
use crate::ntuple::NTupleNetwork;
use crate::threes::Board;

/// One slider decision of an episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Board the slider acted on
    pub before: Board,
    /// Board right after the slide, before the environment placed a tile
    pub after: Board,
    /// Reward of the next slide (0 for the final record)
    pub reward: i32,
}

/// The ordered slider decisions of one episode.
#[derive(Clone, Debug, Default)]
pub struct Episode {
    records: Vec<Transition>,
}

impl Episode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a slide from `before` to `after` that earned `reward`.
    ///
    /// The reward is credited to the previous record, whose afterstate it
    /// was collected from.
    pub fn record(&mut self, before: Board, after: Board, reward: i32) {
        if let Some(prev) = self.records.last_mut() {
            prev.reward = reward;
        }
        self.records.push(Transition {
            before,
            after,
            reward: 0,
        });
    }

    /// Append a record as-is.
    pub fn push(&mut self, transition: Transition) {
        self.records.push(transition);
    }

    pub fn records(&self) -> &[Transition] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Backward n-step TD pass over `episode`.
///
/// For each record, last to first, the target is the next `step` rewards plus
/// the value of the afterstate `step` records ahead (zero past the end). The
/// error against the current value, scaled by `alpha` spread over every table
/// read, is added to the record's afterstate. Returns the mean absolute error.
pub fn td_update(net: &mut NTupleNetwork, episode: &Episode, alpha: f32, step: usize) -> f32 {
    let records = episode.records();
    if records.is_empty() {
        return 0.0;
    }
    let step = step.max(1);
    let rate = alpha / (net.tuples() * ISOMORPHISMS) as f32;

    let mut total_error = 0.0;
    for i in (0..records.len()).rev() {
        let horizon = (i + step).min(records.len());
        let rewards: i32 = records[i..horizon].iter().map(|r| r.reward).sum();
        let bootstrap = records
            .get(i + step)
            .map_or(0.0, |ahead| net.value(&ahead.after));

        let error = rewards as f32 + bootstrap - net.value(&records[i].after);
        net.adjust(&records[i].after, rate * error);
        total_error += error.abs();
    }
    total_error / records.len() as f32
}
