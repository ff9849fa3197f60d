//! Agents behind one `Policy` interface.
//!
//! Every agent is built from an [`AgentConfig`] and selected by its `name`:
//!
//! - NoGo players: `random`, `mcts`
//! - Threes sliders: `random`, `td`
//! - Threes placers: `random`

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{AgentConfig, SearchMode};
use crate::error::{ConfigError, WeightError};
use crate::game::{Game, MoveError};
use crate::learned::{ValueEvaluator, expectimax};
use crate::mcts::{Budget, RandomPlayout, parallel_search, search};
use crate::nogo::{self, Side};
use crate::ntuple::NTupleNetwork;
use crate::td::{Episode, td_update};
use crate::threes::{self, Direction, SliderGame};

/// A move-choosing strategy.
pub trait Policy {
    type Board;
    type Move;

    fn name(&self) -> &str;

    /// Pick a move for `board`, or `None` when there is nothing to play.
    fn choose_move(&mut self, board: &Self::Board) -> Result<Option<Self::Move>, MoveError>;

    /// Learn from a finished episode.
    fn update(&mut self, _episode: &Episode) {}

    /// Called once when the agent is retired.
    fn finish(&mut self) -> Result<(), WeightError> {
        Ok(())
    }
}

pub type NogoAgent = dyn Policy<Board = nogo::Board, Move = nogo::Placement>;
pub type SliderAgent = dyn Policy<Board = threes::Board, Move = Direction>;
pub type PlacerAgent = dyn Policy<Board = threes::Board, Move = threes::Placement>;

/// Build a NoGo player; `role` must be `black` or `white`.
pub fn nogo_player(cfg: AgentConfig) -> Result<Box<NogoAgent>, ConfigError> {
    match cfg.name() {
        "random" => Ok(Box::new(RandomPlayer::new(cfg)?)),
        "mcts" => Ok(Box::new(MctsPlayer::new(cfg)?)),
        other => Err(ConfigError::UnknownAgent(other.to_string())),
    }
}

/// Build a Threes slider; `role` must be `slider` or left unset.
pub fn threes_slider(cfg: AgentConfig) -> Result<Box<SliderAgent>, ConfigError> {
    check_role(&cfg, "slider")?;
    match cfg.name() {
        "random" => Ok(Box::new(RandomSlider::new(cfg)?)),
        "td" => Ok(Box::new(TdSlider::new(cfg)?)),
        other => Err(ConfigError::UnknownAgent(other.to_string())),
    }
}

/// Build a Threes placer; `role` must be `placer` or left unset.
pub fn threes_placer(cfg: AgentConfig) -> Result<Box<PlacerAgent>, ConfigError> {
    check_role(&cfg, "placer")?;
    match cfg.name() {
        "random" => Ok(Box::new(RandomPlacer::new(cfg)?)),
        other => Err(ConfigError::UnknownAgent(other.to_string())),
    }
}

fn side_of(cfg: &AgentConfig) -> Result<Side, ConfigError> {
    match cfg.role() {
        "black" => Ok(Side::Black),
        "white" => Ok(Side::White),
        other => Err(ConfigError::InvalidRole(other.to_string())),
    }
}

fn check_role(cfg: &AgentConfig, seat: &str) -> Result<(), ConfigError> {
    match cfg.role() {
        "unknown" => Ok(()),
        role if role == seat => Ok(()),
        other => Err(ConfigError::InvalidRole(other.to_string())),
    }
}

// =============================================================================
// NoGo
// =============================================================================

/// Plays a uniformly random legal placement.
pub struct RandomPlayer {
    cfg: AgentConfig,
    side: Side,
    rng: fastrand::Rng,
}

impl RandomPlayer {
    pub fn new(cfg: AgentConfig) -> Result<Self, ConfigError> {
        let side = side_of(&cfg)?;
        let rng = fastrand::Rng::with_seed(cfg.seed()?);
        Ok(Self { cfg, side, rng })
    }
}

impl Policy for RandomPlayer {
    type Board = nogo::Board;
    type Move = nogo::Placement;

    fn name(&self) -> &str {
        self.cfg.name()
    }

    fn choose_move(&mut self, board: &nogo::Board) -> Result<Option<nogo::Placement>, MoveError> {
        if board.side_to_move() != self.side {
            return Err(MoveError::WrongSide);
        }
        Ok(board.random_move(&mut self.rng))
    }
}

/// Picks the most visited root move of a (possibly root-parallel) UCT search.
pub struct MctsPlayer {
    cfg: AgentConfig,
    side: Side,
    budget: Budget,
    trees: usize,
    rng: fastrand::Rng,
}

impl MctsPlayer {
    pub fn new(cfg: AgentConfig) -> Result<Self, ConfigError> {
        let side = side_of(&cfg)?;
        let budget = cfg.budget()?;
        let trees = cfg.parallel()?;
        let rng = fastrand::Rng::with_seed(cfg.seed()?);
        Ok(Self {
            cfg,
            side,
            budget,
            trees,
            rng,
        })
    }
}

impl Policy for MctsPlayer {
    type Board = nogo::Board;
    type Move = nogo::Placement;

    fn name(&self) -> &str {
        self.cfg.name()
    }

    fn choose_move(&mut self, board: &nogo::Board) -> Result<Option<nogo::Placement>, MoveError> {
        if board.side_to_move() != self.side {
            return Err(MoveError::WrongSide);
        }
        let outcome = if self.trees > 1 {
            let seed = self.rng.u64(..);
            parallel_search(board, self.budget, &RandomPlayout, seed, self.trees)?
        } else {
            search(board, self.budget, &RandomPlayout, &mut self.rng)?
        };
        Ok(outcome.best)
    }
}

// =============================================================================
// Threes
// =============================================================================

/// Slides in a random legal direction.
pub struct RandomSlider {
    cfg: AgentConfig,
    rng: fastrand::Rng,
}

impl RandomSlider {
    pub fn new(cfg: AgentConfig) -> Result<Self, ConfigError> {
        let rng = fastrand::Rng::with_seed(cfg.seed()?);
        Ok(Self { cfg, rng })
    }
}

impl Policy for RandomSlider {
    type Board = threes::Board;
    type Move = Direction;

    fn name(&self) -> &str {
        self.cfg.name()
    }

    fn choose_move(&mut self, board: &threes::Board) -> Result<Option<Direction>, MoveError> {
        Ok(self.rng.choice(board.legal_slides()))
    }
}

/// The Threes environment: drops the hint tile on a random free entry cell.
pub struct RandomPlacer {
    cfg: AgentConfig,
    rng: fastrand::Rng,
}

impl RandomPlacer {
    pub fn new(cfg: AgentConfig) -> Result<Self, ConfigError> {
        let rng = fastrand::Rng::with_seed(cfg.seed()?);
        Ok(Self { cfg, rng })
    }
}

impl Policy for RandomPlacer {
    type Board = threes::Board;
    type Move = threes::Placement;

    fn name(&self) -> &str {
        self.cfg.name()
    }

    fn choose_move(
        &mut self,
        board: &threes::Board,
    ) -> Result<Option<threes::Placement>, MoveError> {
        Ok(board.random_placement(&mut self.rng))
    }
}

/// A slider that learns an afterstate value with TD(n).
///
/// Weights are loaded from `load=` when the agent is built and written to
/// `save=` when it is finished.
pub struct TdSlider {
    cfg: AgentConfig,
    net: NTupleNetwork,
    alpha: f32,
    step: usize,
    mode: SearchMode,
    budget: Budget,
    save: Option<PathBuf>,
    rng: fastrand::Rng,
}

impl TdSlider {
    pub fn new(cfg: AgentConfig) -> Result<Self, ConfigError> {
        Self::with_network(cfg, NTupleNetwork::default())
    }

    /// Build around `net`, replacing its weights from `load=` if given.
    pub fn with_network(cfg: AgentConfig, mut net: NTupleNetwork) -> Result<Self, ConfigError> {
        if let Some(path) = cfg.load_path() {
            net.load(&path)?;
            info!(path = %path.display(), tables = net.tuples(), "loaded weights");
        }
        Ok(Self {
            net,
            alpha: cfg.alpha()?,
            step: cfg.step()?,
            mode: cfg.search()?,
            budget: cfg.budget()?,
            save: cfg.save_path(),
            rng: fastrand::Rng::with_seed(cfg.seed()?),
            cfg,
        })
    }

    pub fn network(&self) -> &NTupleNetwork {
        &self.net
    }

    /// The slide maximising reward plus the expected value of the reply.
    fn greedy(&mut self, board: &threes::Board) -> Option<Direction> {
        let mut best: Option<(Direction, f32)> = None;
        for dir in Direction::ALL {
            let mut after = board.clone();
            let Ok(reward) = after.slide(dir) else {
                continue;
            };
            let score = reward as f32 + expectimax(&self.net, &after, dir, &mut self.rng);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((dir, score));
            }
        }
        best.map(|(dir, _)| dir)
    }
}

impl Policy for TdSlider {
    type Board = threes::Board;
    type Move = Direction;

    fn name(&self) -> &str {
        self.cfg.name()
    }

    fn choose_move(&mut self, board: &threes::Board) -> Result<Option<Direction>, MoveError> {
        match self.mode {
            SearchMode::Greedy => Ok(self.greedy(board)),
            SearchMode::Mcts => {
                let root = SliderGame::new(board.clone(), self.rng.u64(..));
                let evaluator = ValueEvaluator::new(&self.net, true);
                Ok(search(&root, self.budget, &evaluator, &mut self.rng)?.best)
            }
        }
    }

    fn update(&mut self, episode: &Episode) {
        let error = td_update(&mut self.net, episode, self.alpha, self.step);
        debug!(records = episode.len(), error, "td update");
    }

    fn finish(&mut self) -> Result<(), WeightError> {
        if let Some(path) = &self.save {
            self.net.save(path)?;
            info!(path = %path.display(), "saved weights");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(args: &str) -> AgentConfig {
        AgentConfig::parse(args).unwrap()
    }

    fn small_network() -> NTupleNetwork {
        NTupleNetwork::new(vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]])
    }

    #[test]
    fn test_factories_select_by_name() {
        assert_eq!(nogo_player(cfg("name=mcts role=black")).unwrap().name(), "mcts");
        assert_eq!(threes_slider(cfg("name=td")).unwrap().name(), "td");
        assert_eq!(threes_placer(cfg("name=random")).unwrap().name(), "random");
        assert!(matches!(
            nogo_player(cfg("name=alphago role=black")),
            Err(ConfigError::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_nogo_player_requires_role() {
        assert!(matches!(
            nogo_player(cfg("name=random")),
            Err(ConfigError::InvalidRole(r)) if r == "unknown"
        ));
        assert!(matches!(
            nogo_player(cfg("name=mcts role=slider")),
            Err(ConfigError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_threes_agents_check_role() {
        assert!(matches!(
            threes_slider(cfg("name=td role=black")),
            Err(ConfigError::InvalidRole(r)) if r == "black"
        ));
        assert!(matches!(
            threes_placer(cfg("name=random role=slider")),
            Err(ConfigError::InvalidRole(_))
        ));
        assert!(threes_slider(cfg("name=random role=slider")).is_ok());
        assert!(threes_placer(cfg("name=random role=placer")).is_ok());
        assert!(threes_placer(cfg("name=random")).is_ok());
    }

    #[test]
    fn test_mcts_player_rejects_zero_budget() {
        for args in ["simulation=0", "timeout=0"] {
            assert!(matches!(
                nogo_player(cfg(&format!("name=mcts role=black {args}"))),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn test_player_refuses_to_move_out_of_turn() {
        let mut white = nogo_player(cfg("name=random role=white")).unwrap();
        assert_eq!(
            white.choose_move(&nogo::Board::new()),
            Err(MoveError::WrongSide)
        );
    }

    #[test]
    fn test_mcts_player_plays_legal_move() {
        let mut player = nogo_player(cfg("name=mcts role=black simulation=50 parallel=2")).unwrap();
        let board = nogo::Board::new();
        let mv = player.choose_move(&board).unwrap().unwrap();
        assert_eq!(mv.side, Side::Black);
        assert!(board.is_legal(mv.position, Side::Black));
    }

    #[test]
    fn test_missing_weight_file_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        let result = TdSlider::with_network(
            cfg(&format!("name=td load={}", path.display())),
            small_network(),
        );
        assert!(matches!(result, Err(ConfigError::Weights(WeightError::Io { .. }))));
    }

    #[test]
    fn test_td_slider_modes_pick_legal_slides() {
        let mut cells = [0; 16];
        cells[0] = 1;
        cells[1] = 2;
        cells[6] = 3;
        let board = threes::Board::from_cells(cells);
        let legal = board.legal_slides();

        for mode in ["greedy", "mcts"] {
            let args = format!("name=td search={mode} simulation=30");
            let mut slider = TdSlider::with_network(cfg(&args), small_network()).unwrap();
            let dir = slider.choose_move(&board).unwrap().unwrap();
            assert!(legal.contains(&dir), "{mode} chose {dir}");
        }
    }

    #[test]
    fn test_td_slider_saves_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        let args = format!("name=td save={}", path.display());
        let mut slider = TdSlider::with_network(cfg(&args), small_network()).unwrap();
        slider.finish().unwrap();

        let mut loaded = small_network();
        loaded.load(&path).unwrap();
        assert_eq!(&loaded, slider.network());
    }
}
