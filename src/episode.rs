//! Game and episode runners.
//!
//! A NoGo game alternates the two players until the side to move has no
//! move; that side loses. A Threes episode lets the placer open with nine
//! tiles, then alternates slides and placements until the slider is stuck,
//! recording every slide for the slider's TD update.

use tracing::debug;

use crate::constants::THREES_CELLS;
use crate::game::{Game, MoveError};
use crate::nogo::{self, Side};
use crate::policy::{NogoAgent, PlacerAgent, SliderAgent};
use crate::td::Episode;
use crate::threes;

/// Tiles the placer drops before the first slide.
pub const OPENING_TILES: usize = 9;

/// A finished NoGo game.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub winner: Side,
    pub moves: Vec<nogo::Placement>,
}

/// Play one NoGo game between `black` and `white` from the empty board.
pub fn play_nogo_game(
    black: &mut NogoAgent,
    white: &mut NogoAgent,
) -> Result<GameRecord, MoveError> {
    let mut board = nogo::Board::new();
    let mut moves = Vec::new();

    loop {
        let side = board.side_to_move();
        let player = match side {
            Side::Black => &mut *black,
            Side::White => &mut *white,
        };
        let Some(mv) = player.choose_move(&board)? else {
            break;
        };
        board.play(mv)?;
        moves.push(mv);
    }

    let winner = board.side_to_move().opponent();
    debug!(%winner, moves = moves.len(), "nogo game finished");
    Ok(GameRecord { winner, moves })
}

/// A finished Threes episode.
#[derive(Clone, Debug)]
pub struct EpisodeRecord {
    pub score: i32,
    /// Largest tile index on the final board
    pub max_tile: u8,
    pub trace: Episode,
}

/// Play one Threes episode and let the slider learn from it.
pub fn play_threes_episode(
    slider: &mut SliderAgent,
    placer: &mut PlacerAgent,
) -> Result<EpisodeRecord, MoveError> {
    let mut board = threes::Board::new();
    for _ in 0..OPENING_TILES.min(THREES_CELLS) {
        let Some(p) = placer.choose_move(&board)? else {
            break;
        };
        board.place(p)?;
    }

    let mut trace = Episode::new();
    while let Some(dir) = slider.choose_move(&board)? {
        let before = board.clone();
        let reward = board.slide(dir)?;
        trace.record(before, board.clone(), reward);

        let Some(p) = placer.choose_move(&board)? else {
            break;
        };
        board.place(p)?;
    }

    slider.update(&trace);

    let score = board.score();
    let max_tile = board.cells().iter().copied().max().unwrap_or(0);
    debug!(score, max_tile, slides = trace.len(), "threes episode finished");
    Ok(EpisodeRecord {
        score,
        max_tile,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::policy::{nogo_player, threes_placer, threes_slider};

    fn agent_cfg(args: &str) -> AgentConfig {
        AgentConfig::parse(args).unwrap()
    }

    #[test]
    fn test_random_nogo_game_ends_with_stuck_loser() {
        let mut black = nogo_player(agent_cfg("name=random role=black seed=1")).unwrap();
        let mut white = nogo_player(agent_cfg("name=random role=white seed=2")).unwrap();
        let record = play_nogo_game(&mut *black, &mut *white).unwrap();

        let mut board = nogo::Board::new();
        for &mv in &record.moves {
            board.play(mv).unwrap();
        }
        assert!(board.is_terminal());
        assert_eq!(board.side_to_move(), record.winner.opponent());
    }

    #[test]
    fn test_swapped_roles_are_rejected() {
        let mut black = nogo_player(agent_cfg("name=random role=white")).unwrap();
        let mut white = nogo_player(agent_cfg("name=random role=white")).unwrap();
        assert_eq!(
            play_nogo_game(&mut *black, &mut *white).unwrap_err(),
            MoveError::WrongSide
        );
    }

    #[test]
    fn test_threes_episode_records_every_slide() {
        let mut slider = threes_slider(agent_cfg("name=random seed=3")).unwrap();
        let mut placer = threes_placer(agent_cfg("name=random seed=4")).unwrap();
        let record = play_threes_episode(&mut *slider, &mut *placer).unwrap();

        assert!(!record.trace.is_empty());
        let last = record.trace.records().last().unwrap();
        assert_eq!(last.reward, 0);
        for t in record.trace.records() {
            let dir = t.after.last().unwrap();
            let mut replay = t.before.clone();
            replay.slide(dir).unwrap();
            assert_eq!(replay, t.after);
        }
        assert!(record.score >= 0);
    }
}
