//! Threes board representation, slides, and tile placement.
//!
//! Cells hold tile indices: 0 is empty, 1 and 2 are the "1" and "2" tiles,
//! and index `k >= 3` is the tile `3 * 2^(k - 3)`. A slide moves every tile
//! at most one step toward the wall; a 1 and a 2 merge into a 3, and two equal
//! tiles of index 3 or more merge into the next index.
//!
//! The environment (placer) then drops the current hint tile on the edge
//! opposite to the slide and draws a new hint from the bag. The bag holds one
//! each of 1, 2 and 3 and is refilled once empty.

use std::fmt;

use crate::constants::{PLACER_SPACES, THREES_CELLS, THREES_MAX_TILE, THREES_N};
use crate::game::{Game, MoveError};

/// A slide direction, encoded as the opcodes 0..4.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Cell lines for this slide, each ordered from the wall outward.
    fn lines(self) -> [[usize; THREES_N]; THREES_N] {
        std::array::from_fn(|k| {
            std::array::from_fn(|j| match self {
                Direction::Left => k * THREES_N + j,
                Direction::Right => k * THREES_N + (THREES_N - 1 - j),
                Direction::Up => j * THREES_N + k,
                Direction::Down => (THREES_N - 1 - j) * THREES_N + k,
            })
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "#U",
            Direction::Right => "#R",
            Direction::Down => "#D",
            Direction::Left => "#L",
        };
        f.write_str(name)
    }
}

/// An environment move: put `tile` at `position` and announce `hint` next.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub position: usize,
    pub tile: u8,
    pub hint: u8,
}

/// Source cell of each cell after a clockwise rotation.
pub const ROTATE_SRC: [usize; THREES_CELLS] = [
    12, 8, 4, 0, 13, 9, 5, 1, 14, 10, 6, 2, 15, 11, 7, 3,
];

/// Source cell of each cell after a horizontal reflection.
pub const REFLECT_SRC: [usize; THREES_CELLS] = [
    3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12,
];

/// A Threes position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    tile: [u8; THREES_CELLS],
    bag: [u8; 3],
    hint: u8,
    last: Option<Direction>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board with a full bag and no hint.
    pub fn new() -> Self {
        Self {
            tile: [0; THREES_CELLS],
            bag: [1; 3],
            hint: 0,
            last: None,
        }
    }

    /// A board with the given cells, full bag and no hint.
    pub fn from_cells(tile: [u8; THREES_CELLS]) -> Self {
        Self {
            tile,
            ..Self::new()
        }
    }

    /// Tile index at a cell.
    #[inline]
    pub fn cell(&self, pos: usize) -> u8 {
        self.tile[pos]
    }

    pub fn cells(&self) -> &[u8; THREES_CELLS] {
        &self.tile
    }

    /// Remaining copies of `tile` (1..=3) in the bag.
    pub fn bag(&self, tile: u8) -> u8 {
        match tile {
            1..=3 => self.bag[tile as usize - 1],
            _ => 0,
        }
    }

    /// The next tile the placer must drop, or 0 before the first placement.
    pub fn hint(&self) -> u8 {
        self.hint
    }

    /// The most recent slide.
    pub fn last(&self) -> Option<Direction> {
        self.last
    }

    /// Score of the board: each tile of index `k >= 3` scores `3^(k - 2)`.
    pub fn score(&self) -> i32 {
        self.tile
            .iter()
            .filter(|&&t| t >= 3)
            .map(|&t| 3i32.pow(t as u32 - 2))
            .sum()
    }

    /// Number of empty cells.
    pub fn empty_cells(&self) -> usize {
        self.tile.iter().filter(|&&t| t == 0).count()
    }

    /// Slide all lines toward the wall of `dir`.
    ///
    /// Returns the score gained. A slide that moves nothing is illegal and
    /// leaves the board unchanged.
    pub fn slide(&mut self, dir: Direction) -> Result<i32, MoveError> {
        let before = self.score();
        let mut moved = false;

        for line in dir.lines() {
            for j in 1..THREES_N {
                let (near, far) = (line[j - 1], line[j]);
                let (a, b) = (self.tile[near], self.tile[far]);
                if b == 0 {
                    continue;
                }
                let merged = if a == 0 {
                    Some(b)
                } else if a + b == 3 && a != b {
                    Some(3)
                } else if a == b && a >= 3 && a < THREES_MAX_TILE {
                    Some(a + 1)
                } else {
                    None
                };
                if let Some(t) = merged {
                    self.tile[near] = t;
                    self.tile[far] = 0;
                    moved = true;
                }
            }
        }

        if !moved {
            return Err(MoveError::NoSlide);
        }
        self.last = Some(dir);
        Ok(self.score() - before)
    }

    /// Cells the placer may fill next.
    pub fn placement_spaces(&self) -> &'static [usize] {
        const ALL: [usize; THREES_CELLS] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
        match self.last {
            Some(dir) => &PLACER_SPACES[dir.index()],
            None => &ALL,
        }
    }

    /// Drop a tile and announce the next hint.
    ///
    /// Before the first hint exists the tile itself is drawn from the bag;
    /// afterwards it must equal the announced hint.
    pub fn place(&mut self, mv: Placement) -> Result<(), MoveError> {
        if mv.position >= THREES_CELLS {
            return Err(MoveError::OutOfRange);
        }
        if self.tile[mv.position] != 0 {
            return Err(MoveError::Occupied);
        }
        if !self.placement_spaces().contains(&mv.position) {
            return Err(MoveError::WrongEdge);
        }
        if !(1..=3).contains(&mv.tile) || !(1..=3).contains(&mv.hint) {
            return Err(MoveError::BadTile);
        }

        let mut bag = self.bag;
        if self.hint == 0 {
            take(&mut bag, mv.tile)?;
        } else if mv.tile != self.hint {
            return Err(MoveError::BadTile);
        }
        take(&mut bag, mv.hint)?;

        self.tile[mv.position] = mv.tile;
        self.bag = bag;
        self.hint = mv.hint;
        Ok(())
    }

    /// Draw a (tile, hint) pair the way [`Board::place`] will accept it.
    pub fn draw(&self, rng: &mut fastrand::Rng) -> (u8, u8) {
        let mut bag = self.bag;
        let tile = if self.hint == 0 {
            pick(&mut bag, rng)
        } else {
            self.hint
        };
        let hint = pick(&mut bag, rng);
        (tile, hint)
    }

    /// A random legal placement on the entry edge, if any cell is free.
    pub fn random_placement(&self, rng: &mut fastrand::Rng) -> Option<Placement> {
        let mut space = self.placement_spaces().to_vec();
        rng.shuffle(&mut space);
        let position = space.into_iter().find(|&pos| self.tile[pos] == 0)?;
        let (tile, hint) = self.draw(rng);
        Some(Placement {
            position,
            tile,
            hint,
        })
    }

    /// Directions that move at least one tile.
    pub fn legal_slides(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| self.clone().slide(dir).is_ok())
            .collect()
    }

    /// Rotate the cells clockwise in place.
    pub fn rotate_clockwise(&mut self) {
        let old = self.tile;
        self.tile = std::array::from_fn(|i| old[ROTATE_SRC[i]]);
    }

    /// Mirror the cells left to right in place.
    pub fn reflect_horizontal(&mut self) {
        let old = self.tile;
        self.tile = std::array::from_fn(|i| old[REFLECT_SRC[i]]);
    }
}

/// Refill an exhausted bag, then remove one `tile`.
fn take(bag: &mut [u8; 3], tile: u8) -> Result<(), MoveError> {
    if bag.iter().all(|&n| n == 0) {
        *bag = [1; 3];
    }
    let slot = &mut bag[tile as usize - 1];
    if *slot == 0 {
        return Err(MoveError::BadTile);
    }
    *slot -= 1;
    Ok(())
}

/// Refill an exhausted bag, then remove and return a random tile.
fn pick(bag: &mut [u8; 3], rng: &mut fastrand::Rng) -> u8 {
    if bag.iter().all(|&n| n == 0) {
        *bag = [1; 3];
    }
    let mut available = Vec::with_capacity(3);
    for (i, &n) in bag.iter().enumerate() {
        for _ in 0..n {
            available.push(i as u8 + 1);
        }
    }
    let tile = available[rng.usize(..available.len())];
    bag[tile as usize - 1] -= 1;
    tile
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..THREES_N {
            for col in 0..THREES_N {
                let t = self.tile[row * THREES_N + col];
                let v = match t {
                    0..=2 => t as u32,
                    _ => 3 << (t - 3),
                };
                write!(f, "{v:>6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The only decision maker of the slider's view of the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slider;

/// The slider's view of a Threes game, used as a search state.
///
/// Applying a slide also lets the environment place its tile, with the
/// placement randomness drawn from a seed carried in the state, so a snapshot
/// and a move always lead to the same successor.
#[derive(Clone, Debug)]
pub struct SliderGame {
    board: Board,
    after: Board,
    gained: i32,
    env_seed: u64,
}

impl SliderGame {
    pub fn new(board: Board, env_seed: u64) -> Self {
        Self {
            after: board.clone(),
            board,
            gained: 0,
            env_seed,
        }
    }

    /// Board the slider acts on next.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Board right after the most recent slide (before the tile drop).
    pub fn after(&self) -> &Board {
        &self.after
    }

    /// Score collected since this view was created.
    pub fn gained(&self) -> i32 {
        self.gained
    }
}

impl Game for SliderGame {
    type Move = Direction;
    type Side = Slider;

    fn side_to_move(&self) -> Slider {
        Slider
    }

    fn legal_moves(&self) -> Vec<Direction> {
        self.board.legal_slides()
    }

    fn apply(&mut self, dir: Direction) -> Result<(), MoveError> {
        let mut after = self.board.clone();
        let reward = after.slide(dir)?;

        let mut rng = fastrand::Rng::with_seed(self.env_seed);
        let mut next = after.clone();
        if let Some(placement) = next.random_placement(&mut rng) {
            next.place(placement)?;
        }

        self.env_seed = rng.u64(..);
        self.gained += reward;
        self.after = after;
        self.board = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: [u8; 4]) -> Board {
        let mut tile = [0; THREES_CELLS];
        tile[..4].copy_from_slice(&cells);
        Board::from_cells(tile)
    }

    #[test]
    fn test_slide_moves_one_step() {
        let mut b = row([0, 3, 0, 6]);
        assert_eq!(b.slide(Direction::Left), Ok(0));
        assert_eq!(&b.cells()[..4], &[3, 0, 6, 0]);
    }

    #[test]
    fn test_one_and_two_merge() {
        let mut b = row([1, 2, 0, 0]);
        let reward = b.slide(Direction::Left).unwrap();
        assert_eq!(&b.cells()[..4], &[3, 0, 0, 0]);
        assert_eq!(reward, 3);
    }

    #[test]
    fn test_equal_ones_do_not_merge() {
        let mut b = row([1, 1, 1, 1]);
        assert_eq!(b.slide(Direction::Left), Err(MoveError::NoSlide));
        assert_eq!(&b.cells()[..4], &[1, 1, 1, 1], "illegal slide leaves board");
    }

    #[test]
    fn test_equal_large_tiles_merge_once() {
        let mut b = row([3, 3, 3, 0]);
        let reward = b.slide(Direction::Left).unwrap();
        assert_eq!(&b.cells()[..4], &[4, 3, 0, 0]);
        // 3+3 -> 6: score goes from 3+3+3 to 9+3.
        assert_eq!(reward, 3);
    }

    #[test]
    fn test_slide_right_and_vertical() {
        let mut b = row([0, 0, 3, 0]);
        b.slide(Direction::Right).unwrap();
        assert_eq!(b.cell(3), 3);

        let mut b = row([0, 0, 3, 0]);
        b.slide(Direction::Down).unwrap();
        assert_eq!(b.cell(6), 3);
        assert_eq!(b.slide(Direction::Up), Ok(0));
        assert_eq!(b.cell(2), 3);
        assert_eq!(b.last(), Some(Direction::Up));
    }

    #[test]
    fn test_place_on_entry_edge() {
        let mut b = row([0, 3, 0, 0]);
        b.slide(Direction::Left).unwrap();
        assert_eq!(b.placement_spaces(), &[3, 7, 11, 15]);

        let off_edge = Placement {
            position: 5,
            tile: 1,
            hint: 2,
        };
        assert_eq!(b.place(off_edge), Err(MoveError::WrongEdge));

        let ok = Placement {
            position: 7,
            tile: 1,
            hint: 2,
        };
        b.place(ok).unwrap();
        assert_eq!(b.cell(7), 1);
        assert_eq!(b.hint(), 2);
        assert_eq!(b.bag(1) + b.bag(2) + b.bag(3), 1);
    }

    #[test]
    fn test_tile_must_match_hint() {
        let mut b = Board::new();
        let first = Placement {
            position: 0,
            tile: 1,
            hint: 3,
        };
        b.place(first).unwrap();
        let wrong = Placement {
            position: 1,
            tile: 2,
            hint: 2,
        };
        assert_eq!(b.place(wrong), Err(MoveError::BadTile));
    }

    #[test]
    fn test_random_placements_are_accepted() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut b = Board::new();
        for _ in 0..9 {
            let p = b.random_placement(&mut rng).unwrap();
            b.place(p).unwrap();
        }
        assert_eq!(b.empty_cells(), 7);
        assert!((1..=3).contains(&b.hint()));
    }

    #[test]
    fn test_rotate_four_times_is_identity() {
        let b = Board::from_cells(std::array::from_fn(|i| i as u8));
        let mut r = b.clone();
        r.rotate_clockwise();
        assert_eq!(r.cell(0), 12);
        assert_eq!(r.cell(3), 0);
        for _ in 0..3 {
            r.rotate_clockwise();
        }
        assert_eq!(r, b);

        let mut m = b.clone();
        m.reflect_horizontal();
        assert_eq!(m.cell(0), 3);
        m.reflect_horizontal();
        assert_eq!(m, b);
    }

    #[test]
    fn test_slider_game_is_deterministic() {
        let mut b = Board::new();
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..9 {
            let p = b.random_placement(&mut rng).unwrap();
            b.place(p).unwrap();
        }
        let game = SliderGame::new(b, 99);
        let dir = game.legal_moves()[0];

        let mut g1 = game.clone();
        let mut g2 = game.clone();
        g1.apply(dir).unwrap();
        g2.apply(dir).unwrap();
        assert_eq!(g1.board(), g2.board());
        assert_eq!(g1.after().empty_cells(), g1.board().empty_cells() + 1);
    }
}
