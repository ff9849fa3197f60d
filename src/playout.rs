//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves, alternating sides, until the
//! side to move has no legal move. That side loses (NoGo scoring).

use crate::game::{Game, MoveError};

/// Play random moves from `state` until no move remains.
///
/// Returns the side that could not move, i.e. the loser.
pub fn random_playout<G: Game>(state: &G, rng: &mut fastrand::Rng) -> Result<G::Side, MoveError> {
    let mut pos = state.clone();
    while let Some(mv) = pos.random_move(rng) {
        pos.apply(mv)?;
    }
    Ok(pos.side_to_move())
}

/// Outcome of a game lost by `loser`, from `root_side`'s perspective.
#[inline]
pub fn score_for<S: PartialEq>(loser: S, root_side: S) -> f64 {
    if loser == root_side { 0.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nogo::{Board, Side};

    #[test]
    fn test_playout_ends_in_terminal_position() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..10 {
            let board = Board::new();
            let loser = random_playout(&board, &mut rng).unwrap();
            assert!(loser == Side::Black || loser == Side::White);
        }
    }

    #[test]
    fn test_playout_from_terminal_returns_side_to_move() {
        let mut board = Board::new();
        // Fill the board so nothing is legal for Black.
        for pt in 0..crate::constants::NOGO_CELLS {
            board.set(pt, Some(Side::White));
        }
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(random_playout(&board, &mut rng), Ok(Side::Black));
    }

    #[test]
    fn test_score_for() {
        assert_eq!(score_for(Side::Black, Side::Black), 0.0);
        assert_eq!(score_for(Side::White, Side::Black), 1.0);
    }

    #[test]
    fn test_playout_is_reproducible() {
        let board = Board::new();
        let a = random_playout(&board, &mut fastrand::Rng::with_seed(5));
        let b = random_playout(&board, &mut fastrand::Rng::with_seed(5));
        assert_eq!(a, b);
    }
}
