//! Constants for board dimensions, search parameters, and learning defaults.
//!
//! Both games use a flat cell index. NoGo is a 9x9 board indexed row by row
//! (`row * NOGO_N + col`); Threes is a 4x4 board indexed the same way.

// =============================================================================
// NoGo Geometry
// =============================================================================

/// NoGo board size (NxN).
pub const NOGO_N: usize = 9;

/// Number of playable NoGo cells.
pub const NOGO_CELLS: usize = NOGO_N * NOGO_N;

// =============================================================================
// Threes Geometry
// =============================================================================

/// Threes board size (NxN).
pub const THREES_N: usize = 4;

/// Number of Threes cells.
pub const THREES_CELLS: usize = THREES_N * THREES_N;

/// Largest tile index a Threes cell may hold (fits in 4 bits).
pub const THREES_MAX_TILE: u8 = 15;

/// Cells the placer may fill after each slide, indexed by the slide direction
/// (up, right, down, left). A tile always enters on the edge opposite the slide.
pub const PLACER_SPACES: [[usize; 4]; 4] = [
    [12, 13, 14, 15], // after Up: bottom row
    [0, 4, 8, 12],    // after Right: left column
    [0, 1, 2, 3],     // after Down: top row
    [3, 7, 11, 15],   // after Left: right column
];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCT exploration constant.
pub const UCT_C: f64 = 0.5;

/// Iteration budget used when neither `simulation` nor `timeout` is configured.
pub const DEFAULT_SIMULATIONS: u32 = 100;

/// Seed used by agents that were not given `seed=`.
pub const DEFAULT_SEED: u64 = 1234;

// =============================================================================
// n-tuple Network / TD Learning
// =============================================================================

/// Bits used to encode one cell inside a tuple index.
pub const BITS_PER_CELL: u32 = 4;

/// Number of board isomorphisms (4 rotations x 2 reflections).
pub const ISOMORPHISMS: usize = 8;

/// Default tuple patterns of the TD slider.
pub const DEFAULT_TUPLES: [[usize; 6]; 4] = [
    [0, 1, 2, 3, 4, 5],
    [4, 5, 6, 7, 8, 9],
    [5, 6, 7, 9, 10, 11],
    [9, 10, 11, 13, 14, 15],
];

/// Default TD learning rate.
pub const DEFAULT_ALPHA: f32 = 0.1;

/// Default TD bootstrap horizon (TD(0)).
pub const DEFAULT_STEP: usize = 1;
