//! NoGo board representation and move legality.
//!
//! NoGo is played with Go stones on a 9x9 grid, but capturing is forbidden:
//! a placement is legal only if it leaves every group on the board, including
//! the placed stone's own group, with at least one liberty. The side that
//! cannot place a stone loses.

use std::fmt;

use crate::constants::{NOGO_CELLS, NOGO_N};
use crate::game::{Game, MoveError};

/// Stone color, which doubles as the side identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Black,
    White,
}

impl Side {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Black => write!(f, "black"),
            Side::White => write!(f, "white"),
        }
    }
}

/// A cell index on the board.
pub type Point = usize;

/// A stone placement: (position, side).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub position: Point,
    pub side: Side,
}

impl Placement {
    pub fn new(position: Point, side: Side) -> Self {
        Self { position, side }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.side, str_point(self.position))
    }
}

/// A NoGo position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Side>; NOGO_CELLS],
    to_move: Side,
    moves_played: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board with Black to move.
    pub fn new() -> Self {
        Self {
            cells: [None; NOGO_CELLS],
            to_move: Side::Black,
            moves_played: 0,
        }
    }

    /// Stone at a point, if any.
    #[inline]
    pub fn get(&self, pt: Point) -> Option<Side> {
        self.cells.get(pt).copied().flatten()
    }

    /// Number of stones placed so far.
    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    /// Put a stone without any legality check or turn change.
    ///
    /// Used to set up test positions.
    pub fn set(&mut self, pt: Point, stone: Option<Side>) {
        self.cells[pt] = stone;
    }

    /// Check a placement for `side` without modifying the board.
    pub fn check(&self, pt: Point, side: Side) -> Result<(), MoveError> {
        if pt >= NOGO_CELLS {
            return Err(MoveError::OutOfRange);
        }
        if self.cells[pt].is_some() {
            return Err(MoveError::Occupied);
        }

        let mut after = self.cells;
        after[pt] = Some(side);

        let opp = side.opponent();
        for n in neighbors(pt) {
            if after[n] == Some(opp) && !has_liberty(&after, n) {
                return Err(MoveError::Capture);
            }
        }
        if !has_liberty(&after, pt) {
            return Err(MoveError::Suicide);
        }
        Ok(())
    }

    /// Whether `side` may place at `pt`.
    #[inline]
    pub fn is_legal(&self, pt: Point, side: Side) -> bool {
        self.check(pt, side).is_ok()
    }

    /// Place a stone for the side to move.
    pub fn place(&mut self, pt: Point) -> Result<(), MoveError> {
        self.play(Placement::new(pt, self.to_move))
    }

    /// Play a placement; the side must match the side to move.
    pub fn play(&mut self, mv: Placement) -> Result<(), MoveError> {
        if mv.side != self.to_move {
            return Err(MoveError::WrongSide);
        }
        self.check(mv.position, mv.side)?;
        self.cells[mv.position] = Some(mv.side);
        self.to_move = self.to_move.opponent();
        self.moves_played += 1;
        Ok(())
    }
}

impl Game for Board {
    type Move = Placement;
    type Side = Side;

    fn side_to_move(&self) -> Side {
        self.to_move
    }

    fn legal_moves(&self) -> Vec<Placement> {
        let side = self.to_move;
        (0..NOGO_CELLS)
            .filter(|&pt| self.is_legal(pt, side))
            .map(|pt| Placement::new(pt, side))
            .collect()
    }

    fn apply(&mut self, mv: Placement) -> Result<(), MoveError> {
        self.play(mv)
    }

    /// Shuffle the empty cells and take the first legal one, which avoids
    /// testing every cell when most of the board is still open.
    fn random_move(&self, rng: &mut fastrand::Rng) -> Option<Placement> {
        let side = self.to_move;
        let mut candidates: Vec<Point> = (0..NOGO_CELLS)
            .filter(|&pt| self.cells[pt].is_none())
            .collect();

        let n = candidates.len();
        for i in 0..n {
            let j = rng.usize(i..n);
            candidates.swap(i, j);
            if self.is_legal(candidates[i], side) {
                return Some(Placement::new(candidates[i], side));
            }
        }
        None
    }
}

/// Orthogonal neighbors of a point that lie on the board.
fn neighbors(pt: Point) -> impl Iterator<Item = Point> {
    let (row, col) = (pt / NOGO_N, pt % NOGO_N);
    let up = (row > 0).then(|| pt - NOGO_N);
    let down = (row + 1 < NOGO_N).then(|| pt + NOGO_N);
    let left = (col > 0).then(|| pt - 1);
    let right = (col + 1 < NOGO_N).then(|| pt + 1);
    [up, right, down, left].into_iter().flatten()
}

/// Whether the group containing `pt` has at least one liberty.
fn has_liberty(cells: &[Option<Side>; NOGO_CELLS], pt: Point) -> bool {
    let Some(color) = cells[pt] else {
        return true;
    };
    let mut visited = [false; NOGO_CELLS];
    let mut stack = vec![pt];
    visited[pt] = true;

    while let Some(cur) = stack.pop() {
        for n in neighbors(cur) {
            match cells[n] {
                None => return true,
                Some(c) if c == color && !visited[n] => {
                    visited[n] = true;
                    stack.push(n);
                }
                _ => {}
            }
        }
    }
    false
}

/// Convert a point to a coordinate string (e.g. "A1"). Columns skip 'I'.
pub fn str_point(pt: Point) -> String {
    const COLS: &[u8] = b"ABCDEFGHJKLMNOPQRST";
    let (row, col) = (pt / NOGO_N, pt % NOGO_N);
    format!("{}{}", COLS[col] as char, row + 1)
}

/// Parse a coordinate string (e.g. "D4") into a point.
pub fn parse_point(s: &str) -> Option<Point> {
    const COLS: &str = "ABCDEFGHJKLMNOPQRST";
    let s = s.trim().to_ascii_uppercase();
    let mut chars = s.chars();
    let col = COLS.find(chars.next()?)?;
    let row: usize = chars.as_str().parse().ok()?;
    if col >= NOGO_N || row == 0 || row > NOGO_N {
        return None;
    }
    Some((row - 1) * NOGO_N + col)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..NOGO_N).rev() {
            for col in 0..NOGO_N {
                let ch = match self.cells[row * NOGO_N + col] {
                    Some(Side::Black) => 'X',
                    Some(Side::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
