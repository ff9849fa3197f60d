//! Learned evaluation of Threes positions.
//!
//! Instead of a random playout, a slider position is scored by the n-tuple
//! network, optionally looking one placement further: the expected value over
//! every cell where the environment may drop the hint tile, each followed by
//! the slider's best slide.

use crate::game::MoveError;
use crate::mcts::Evaluator;
use crate::ntuple::NTupleNetwork;
use crate::threes::{Board, Direction, Placement, Slider, SliderGame};

/// Expected `reward + value` of the slider's best reply after the
/// environment drops its tile onto `after`, the board produced by sliding `dir`.
///
/// Placements after which no slide is possible contribute zero.
pub fn expectimax(
    net: &NTupleNetwork,
    after: &Board,
    dir: Direction,
    rng: &mut fastrand::Rng,
) -> f32 {
    let open: Vec<usize> = crate::constants::PLACER_SPACES[dir.index()]
        .iter()
        .copied()
        .filter(|&pos| after.cell(pos) == 0)
        .collect();
    if open.is_empty() {
        return 0.0;
    }

    let (tile, hint) = after.draw(rng);
    let total = open.len() as f32;
    let mut sum = 0.0;

    for position in open {
        let mut placed = after.clone();
        let placement = Placement {
            position,
            tile,
            hint,
        };
        if placed.place(placement).is_err() {
            continue;
        }
        if let Some((_, reward, value)) = best_slide(net, &placed) {
            sum += (reward as f32 + value) / total;
        }
    }
    sum
}

/// The slide maximising `reward + value(after)`, with its reward and value.
///
/// Ties keep the earlier direction.
pub fn best_slide(net: &NTupleNetwork, board: &Board) -> Option<(Direction, i32, f32)> {
    let mut best: Option<(Direction, i32, f32)> = None;
    for dir in Direction::ALL {
        let mut after = board.clone();
        let Ok(reward) = after.slide(dir) else {
            continue;
        };
        let value = net.value(&after);
        if best.is_none_or(|(_, r, v)| reward as f32 + value > r as f32 + v) {
            best = Some((dir, reward, value));
        }
    }
    best
}

/// Scores slider positions with the learned network.
#[derive(Clone, Copy, Debug)]
pub struct ValueEvaluator<'a> {
    pub net: &'a NTupleNetwork,
    /// Average over the next tile placement instead of reading the
    /// after-state directly.
    pub lookahead: bool,
}

impl<'a> ValueEvaluator<'a> {
    pub fn new(net: &'a NTupleNetwork, lookahead: bool) -> Self {
        Self { net, lookahead }
    }
}

impl Evaluator<SliderGame> for ValueEvaluator<'_> {
    fn evaluate(
        &self,
        state: &SliderGame,
        _root_side: Slider,
        rng: &mut fastrand::Rng,
    ) -> Result<f64, MoveError> {
        let after = state.after();
        let future = match (self.lookahead, after.last()) {
            (true, Some(dir)) => expectimax(self.net, after, dir, rng),
            _ => self.net.value(after),
        };
        Ok(state.gained() as f64 + future as f64)
    }

    /// A slider that cannot move collects nothing further.
    fn terminal(&self, state: &SliderGame, _root_side: Slider) -> f64 {
        state.gained() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    fn network() -> NTupleNetwork {
        NTupleNetwork::new(vec![vec![0, 1, 2, 3]])
    }

    #[test]
    fn test_best_slide_prefers_reward() {
        let net = network();
        // Left merges 1+2 (reward 3); other slides only move tiles.
        let mut cells = [0; 16];
        cells[0] = 1;
        cells[1] = 2;
        let board = Board::from_cells(cells);
        let (dir, reward, _) = best_slide(&net, &board).unwrap();
        assert_eq!(reward, 3);
        assert!(dir == Direction::Left || dir == Direction::Right);
    }

    #[test]
    fn test_best_slide_none_when_stuck() {
        let net = network();
        // Rows of 1s over rows of 2s still merge vertically.
        let board = Board::from_cells([1, 1, 1, 1, 2, 2, 2, 2, 1, 1, 1, 1, 2, 2, 2, 2]);
        let locked = Board::from_cells([1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
        assert!(best_slide(&net, &board).is_some());
        assert!(best_slide(&net, &locked).is_none());
    }

    #[test]
    fn test_value_evaluator_adds_gained_score() {
        let mut net = network();
        let mut b = Board::new();
        let mut rng = fastrand::Rng::with_seed(4);
        for _ in 0..9 {
            let p = b.random_placement(&mut rng).unwrap();
            b.place(p).unwrap();
        }
        let mut game = SliderGame::new(b, 1);
        let dir = game.legal_moves()[0];
        game.apply(dir).unwrap();

        net.adjust(game.after(), 0.25);
        let expected = game.gained() as f64 + net.value(game.after()) as f64;
        let eval = ValueEvaluator::new(&net, false);
        let got = eval.evaluate(&game, Slider, &mut rng).unwrap();
        assert!((got - expected).abs() < 1e-9);
    }
}
