//! The board abstraction consumed by the search.
//!
//! A [`Game`] value is a full snapshot of the game state. The search never
//! mutates a snapshot it does not own: every exploratory move is applied to a
//! private clone.

use std::fmt::Debug;

use thiserror::Error;

/// Reason a move was rejected by a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Position is off the board.
    #[error("illegal move: position out of range")]
    OutOfRange,
    /// Cell is not empty.
    #[error("illegal move: cell not empty")]
    Occupied,
    /// It is not this side's turn.
    #[error("illegal move: wrong side to move")]
    WrongSide,
    /// The placed stone would have no liberties.
    #[error("illegal move: suicide")]
    Suicide,
    /// The placed stone would capture an opposing group.
    #[error("illegal move: capture")]
    Capture,
    /// A slide that moves no tile.
    #[error("illegal move: nothing slides")]
    NoSlide,
    /// Tile placed outside the edge opened by the last slide.
    #[error("illegal move: cell not on the entry edge")]
    WrongEdge,
    /// Tile or hint that the bag cannot provide.
    #[error("illegal move: tile not available")]
    BadTile,
}

/// A two-player (or single-decision-maker) alternating game.
pub trait Game: Clone {
    /// A move as seen by the side to move.
    type Move: Copy + Eq + Debug + Send;
    /// Identity of a decision maker.
    type Side: Copy + Eq + Debug + Send;

    /// The side that makes the next move.
    fn side_to_move(&self) -> Self::Side;

    /// All legal moves for the side to move, in a stable order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Apply a move in place. On error the board is left unchanged.
    fn apply(&mut self, mv: Self::Move) -> Result<(), MoveError>;

    /// A uniformly random legal move, or `None` at a terminal position.
    fn random_move(&self, rng: &mut fastrand::Rng) -> Option<Self::Move> {
        let moves = self.legal_moves();
        if moves.is_empty() {
            None
        } else {
            Some(moves[rng.usize(..moves.len())])
        }
    }

    /// Terminal test: the side to move has no legal reply.
    fn is_terminal(&self) -> bool {
        self.legal_moves().is_empty()
    }
}
