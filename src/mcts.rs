//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! Each iteration runs four phases over a fresh [`SearchTree`]:
//! - Selection: descend through expanded nodes, always taking an unvisited
//!   child first, otherwise the child with the highest UCT score
//! - Expansion: materialise one child per legal reply of the reached node
//! - Evaluation: score the first new child with an [`Evaluator`]
//! - Backpropagation: add the outcome to every node from there up to the root
//!
//! Outcomes are always stored from the perspective of the side the search is
//! choosing a move for. A node whose side to move is the opponent minimises
//! that mean instead of maximising it.
//!
//! Root parallelism runs several independent trees and sums the root visit
//! counts per move once every tree has used up its budget.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use crate::constants::{DEFAULT_SIMULATIONS, UCT_C};
use crate::game::{Game, MoveError};
use crate::playout::{random_playout, score_for};
use crate::tree::{NodeId, SearchTree};

/// Scores positions reached by the search.
pub trait Evaluator<G: Game> {
    /// Value of a newly expanded node's state for `root_side`.
    fn evaluate(
        &self,
        state: &G,
        root_side: G::Side,
        rng: &mut fastrand::Rng,
    ) -> Result<f64, MoveError>;

    /// Value of a position where the side to move has no legal reply.
    fn terminal(&self, state: &G, root_side: G::Side) -> f64;
}

/// Uniformly random playouts with NoGo scoring: the side that cannot move loses.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPlayout;

impl<G: Game> Evaluator<G> for RandomPlayout {
    fn evaluate(
        &self,
        state: &G,
        root_side: G::Side,
        rng: &mut fastrand::Rng,
    ) -> Result<f64, MoveError> {
        let loser = random_playout(state, rng)?;
        Ok(score_for(loser, root_side))
    }

    fn terminal(&self, state: &G, root_side: G::Side) -> f64 {
        score_for(state.side_to_move(), root_side)
    }
}

/// How long one search may run.
///
/// With both limits set the search stops at whichever is reached first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    pub iterations: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for Budget {
    fn default() -> Self {
        Self::iterations(DEFAULT_SIMULATIONS)
    }
}

impl Budget {
    pub fn iterations(n: u32) -> Self {
        Self {
            iterations: Some(n),
            timeout: None,
        }
    }

    pub fn timeout(d: Duration) -> Self {
        Self {
            iterations: None,
            timeout: Some(d),
        }
    }

    /// Combine optional limits, falling back to the default iteration count.
    pub fn from_limits(iterations: Option<u32>, timeout: Option<Duration>) -> Self {
        if iterations.is_none() && timeout.is_none() {
            Self::default()
        } else {
            Self {
                iterations,
                timeout,
            }
        }
    }

    #[inline]
    fn exhausted(&self, done: u32, started: Instant) -> bool {
        self.iterations.is_some_and(|n| done >= n)
            || self.timeout.is_some_and(|t| started.elapsed() >= t)
    }
}

/// Result of one move decision.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome<M> {
    /// Most visited root move, or `None` when the root has no legal move
    pub best: Option<M>,
    /// Iterations run, summed over all trees
    pub iterations: u32,
    /// Root moves with their (aggregated) visit counts, in first-seen order
    pub visits: Vec<(M, u32)>,
}

/// One search tree and the side it decides for.
pub struct Mcts<G: Game> {
    tree: SearchTree<G>,
    root_side: G::Side,
    iterations: u32,
}

impl<G: Game> Mcts<G> {
    /// A search deciding a move for the side to move in `root`.
    pub fn new(root: G) -> Self {
        let root_side = root.side_to_move();
        Self {
            tree: SearchTree::new(root),
            root_side,
            iterations: 0,
        }
    }

    pub fn tree(&self) -> &SearchTree<G> {
        &self.tree
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Iterate until `budget` is exhausted.
    ///
    /// A root with no legal move spends no iterations.
    pub fn run<E: Evaluator<G>>(
        &mut self,
        budget: Budget,
        evaluator: &E,
        rng: &mut fastrand::Rng,
    ) -> Result<(), MoveError> {
        if self.tree.get(self.tree.root()).state.is_terminal() {
            return Ok(());
        }

        let started = Instant::now();
        let mut done = 0;
        while !budget.exhausted(done, started) {
            self.iterate(evaluator, rng)?;
            done += 1;
        }
        Ok(())
    }

    /// Run one selection / expansion / evaluation / backpropagation pass.
    ///
    /// Returns the node the outcome was propagated from.
    pub fn iterate<E: Evaluator<G>>(
        &mut self,
        evaluator: &E,
        rng: &mut fastrand::Rng,
    ) -> Result<NodeId, MoveError> {
        let mut id = self.tree.root();

        loop {
            let node = self.tree.get(id);
            if !node.expanded {
                break;
            }
            if node.children.is_empty() {
                let outcome = evaluator.terminal(&node.state, self.root_side);
                self.backpropagate(id, outcome);
                return Ok(id);
            }
            id = self.select_child(id);
        }

        let leaf = match self.expand(id, rng)? {
            Some(child) => {
                let outcome = evaluator.evaluate(&self.tree.get(child).state, self.root_side, rng)?;
                self.backpropagate(child, outcome);
                child
            }
            None => {
                let outcome = evaluator.terminal(&self.tree.get(id).state, self.root_side);
                self.backpropagate(id, outcome);
                id
            }
        };
        Ok(leaf)
    }

    /// Pick the child to descend into: the first unvisited child, otherwise
    /// the highest UCT score (ties keep the earlier child).
    fn select_child(&self, id: NodeId) -> NodeId {
        let node = self.tree.get(id);
        let maximizing = node.side_to_move == self.root_side;

        let mut best = node.children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &c in &node.children {
            let child = self.tree.get(c);
            if child.visits == 0 {
                return c;
            }
            let score = child.uct(node.visits, UCT_C, maximizing);
            if score > best_score {
                best_score = score;
                best = c;
            }
        }
        best
    }

    /// Create one child per legal reply, in shuffled order.
    ///
    /// Returns the first child, or `None` if the node is terminal.
    fn expand(&mut self, id: NodeId, rng: &mut fastrand::Rng) -> Result<Option<NodeId>, MoveError> {
        debug_assert!(!self.tree.get(id).expanded, "node expanded twice");

        let state = self.tree.get(id).state.clone();
        let mut moves = state.legal_moves();
        rng.shuffle(&mut moves);
        self.tree.get_mut(id).expanded = true;

        let mut first = None;
        for mv in moves {
            let mut next = state.clone();
            next.apply(mv)?;
            let child = self.tree.add_child(id, mv, next);
            first.get_or_insert(child);
        }
        Ok(first)
    }

    /// Add `outcome` to every node from `from` up to and including the root.
    fn backpropagate(&mut self, from: NodeId, outcome: f64) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            let node = self.tree.get_mut(id);
            node.visits += 1;
            node.reward_sum += outcome;
            cur = node.parent;
        }
        self.iterations += 1;
    }

    /// Root moves with their visit counts, in child order.
    pub fn root_visits(&self) -> Vec<(G::Move, u32)> {
        self.tree.child_visits(self.tree.root())
    }

    /// Most visited root move; the first one in child order wins ties.
    pub fn best_move(&self) -> Option<G::Move> {
        most_visited(&self.root_visits())
    }

    pub fn outcome(&self) -> SearchOutcome<G::Move> {
        SearchOutcome {
            best: self.best_move(),
            iterations: self.iterations,
            visits: self.root_visits(),
        }
    }
}

/// The move with the strictly greatest count, first one on ties.
pub fn most_visited<M: Copy>(visits: &[(M, u32)]) -> Option<M> {
    let mut best: Option<(M, u32)> = None;
    for &(mv, n) in visits {
        if best.is_none_or(|(_, b)| n > b) {
            best = Some((mv, n));
        }
    }
    best.map(|(mv, _)| mv)
}

/// Run a single-tree search from `root`.
pub fn search<G: Game, E: Evaluator<G>>(
    root: &G,
    budget: Budget,
    evaluator: &E,
    rng: &mut fastrand::Rng,
) -> Result<SearchOutcome<G::Move>, MoveError> {
    let mut mcts = Mcts::new(root.clone());
    mcts.run(budget, evaluator, rng)?;
    let outcome = mcts.outcome();
    debug!(
        iterations = outcome.iterations,
        nodes = mcts.tree().len(),
        best = ?outcome.best,
        "search finished"
    );
    Ok(outcome)
}

/// Run `trees` independent searches (tree `i` seeded with `seed + i`) and
/// choose the move with the highest summed root visit count.
pub fn parallel_search<G, E>(
    root: &G,
    budget: Budget,
    evaluator: &E,
    seed: u64,
    trees: usize,
) -> Result<SearchOutcome<G::Move>, MoveError>
where
    G: Game + Send + Sync,
    E: Evaluator<G> + Sync,
{
    let results: Vec<Result<SearchOutcome<G::Move>, MoveError>> = (0..trees.max(1))
        .into_par_iter()
        .map(|i| {
            let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(i as u64));
            let mut mcts = Mcts::new(root.clone());
            mcts.run(budget, evaluator, &mut rng)?;
            Ok(mcts.outcome())
        })
        .collect();

    let mut iterations = 0;
    let mut visits: Vec<(G::Move, u32)> = Vec::new();
    for result in results {
        let outcome = result?;
        iterations += outcome.iterations;
        for (mv, n) in outcome.visits {
            match visits.iter_mut().find(|(m, _)| *m == mv) {
                Some((_, total)) => *total += n,
                None => visits.push((mv, n)),
            }
        }
    }

    let best = most_visited(&visits);
    debug!(trees, iterations, best = ?best, "parallel search finished");
    Ok(SearchOutcome {
        best,
        iterations,
        visits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nogo::{Board, Side};

    #[test]
    fn test_root_visits_match_iterations() {
        let mut mcts = Mcts::new(Board::new());
        let mut rng = fastrand::Rng::with_seed(1);
        mcts.run(Budget::iterations(200), &RandomPlayout, &mut rng).unwrap();

        let root = mcts.tree().get(mcts.tree().root());
        assert_eq!(root.visits, 200);
        assert_eq!(mcts.iterations(), 200);
        let child_sum: u32 = mcts.root_visits().iter().map(|(_, n)| n).sum();
        assert_eq!(child_sum, 200, "no iteration ends at a non-terminal root");
    }

    #[test]
    fn test_backprop_touches_depth_plus_one_nodes() {
        let mut mcts = Mcts::new(Board::new());
        let mut rng = fastrand::Rng::with_seed(9);
        let visits = |m: &Mcts<Board>| -> Vec<u32> {
            m.tree().ids().map(|id| m.tree().get(id).visits).collect()
        };

        for _ in 0..150 {
            let before = visits(&mcts);
            let leaf = mcts.iterate(&RandomPlayout, &mut rng).unwrap();
            let after = visits(&mcts);
            let changed = after
                .iter()
                .enumerate()
                .filter(|&(i, &v)| before.get(i).copied().unwrap_or(0) != v)
                .count();
            assert_eq!(changed, mcts.tree().depth(leaf) + 1);
        }
    }

    #[test]
    fn test_unvisited_child_preferred() {
        let mut mcts = Mcts::new(Board::new());
        let mut rng = fastrand::Rng::with_seed(3);
        // First iteration expands the root and visits one child.
        mcts.iterate(&RandomPlayout, &mut rng).unwrap();
        let n_children = mcts.tree().get(mcts.tree().root()).children.len();

        // Every further root-level step must pick a fresh child until all are tried.
        for k in 1..n_children {
            let visited_before = mcts
                .root_visits()
                .iter()
                .filter(|(_, n)| *n > 0)
                .count();
            assert_eq!(visited_before, k);
            let picked = mcts.select_child(mcts.tree().root());
            assert_eq!(mcts.tree().get(picked).visits, 0);
            mcts.iterate(&RandomPlayout, &mut rng).unwrap();
        }
        assert!(mcts.root_visits().iter().all(|(_, n)| *n >= 1));
    }

    #[test]
    fn test_terminal_root_returns_no_move() {
        let mut board = Board::new();
        for pt in 0..crate::constants::NOGO_CELLS {
            board.set(pt, Some(Side::White));
        }
        let mut rng = fastrand::Rng::with_seed(1);
        let outcome = search(&board, Budget::iterations(50), &RandomPlayout, &mut rng).unwrap();
        assert_eq!(outcome.best, None);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.visits.is_empty());
    }

    #[test]
    fn test_most_visited_ties_take_first() {
        let visits = [('a', 3), ('b', 5), ('c', 5), ('d', 1)];
        assert_eq!(most_visited(&visits), Some('b'));
        assert_eq!(most_visited::<char>(&[]), None);
    }

    #[test]
    fn test_budget_resolution() {
        assert_eq!(Budget::from_limits(None, None), Budget::iterations(DEFAULT_SIMULATIONS));
        let both = Budget::from_limits(Some(10), Some(Duration::from_secs(1)));
        assert_eq!(both.iterations, Some(10));
        assert!(both.timeout.is_some());
    }

    #[test]
    fn test_timeout_budget_stops() {
        let mut rng = fastrand::Rng::with_seed(2);
        let budget = Budget::timeout(Duration::from_millis(20));
        let outcome = search(&Board::new(), budget, &RandomPlayout, &mut rng).unwrap();
        assert!(outcome.iterations > 0);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_parallel_search_sums_visits() {
        let board = Board::new();
        let outcome =
            parallel_search(&board, Budget::iterations(40), &RandomPlayout, 11, 3).unwrap();
        assert_eq!(outcome.iterations, 120);
        let total: u32 = outcome.visits.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 120);
        assert_eq!(outcome.best, most_visited(&outcome.visits));
    }
}
