//! nogo-threes: UCT search and TD-learned n-tuple values for NoGo and Threes.
//!
//! The search core is game-agnostic: anything implementing [`game::Game`]
//! can be searched with [`mcts::search`] or [`mcts::parallel_search`], scored
//! either by random playouts or by a learned evaluator.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, search and learning defaults
//! - [`game`] - The board abstraction consumed by the search
//! - [`nogo`] - 9x9 NoGo rules
//! - [`threes`] - 4x4 Threes rules and the slider's search view
//! - [`tree`] - Node arena for one search
//! - [`mcts`] - UCT search, evaluators and root parallelism
//! - [`playout`] - Random game simulation
//! - [`ntuple`] - n-tuple network and weight files
//! - [`learned`] - Value-based evaluation of Threes positions
//! - [`td`] - Episode traces and the TD(n) update
//! - [`config`] - `key=value` agent options
//! - [`policy`] - Agents behind the `Policy` interface
//! - [`episode`] - Game and episode runners
//! - [`error`] - Configuration and weight file errors
//!
//! ## Example
//!
//! ```
//! use nogo_threes::mcts::{Budget, RandomPlayout, search};
//! use nogo_threes::nogo::Board;
//!
//! let board = Board::new();
//! let mut rng = fastrand::Rng::with_seed(1234);
//! let outcome = search(&board, Budget::iterations(100), &RandomPlayout, &mut rng).unwrap();
//! println!("Best move: {}", outcome.best.unwrap());
//! ```

pub mod config;
pub mod constants;
pub mod episode;
pub mod error;
pub mod game;
pub mod learned;
pub mod mcts;
pub mod nogo;
pub mod ntuple;
pub mod playout;
pub mod policy;
pub mod td;
pub mod threes;
pub mod tree;
