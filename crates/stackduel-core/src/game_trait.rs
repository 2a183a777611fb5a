use serde::{Deserialize, Serialize};

use crate::board::Board;

/// The local falling-block simulation a client runs for its own board.
///
/// Piece shapes, rotation and collision live behind this trait; the
/// networking layer only needs the board, the counters, and a way to push
/// penalty rows in.
pub trait LocalGame {
    /// Settled cells, excluding the falling piece.
    fn board(&self) -> &Board;

    fn score(&self) -> u64;

    /// Total rows cleared so far.
    fn lines(&self) -> u64;

    fn is_game_over(&self) -> bool;

    /// Shift the falling piece horizontally by `dx` columns if it fits.
    fn move_piece(&mut self, dx: i8);

    /// Move the falling piece down one row, settling it if it lands.
    fn drop_piece(&mut self) -> Vec<GameEvent>;

    fn rotate(&mut self);

    /// Push `count` penalty rows in from the bottom of the board.
    fn add_penalty_lines(&mut self, count: u32);

    /// Advance gravity by `delta_ms` milliseconds.
    fn update(&mut self, delta_ms: u32) -> Vec<GameEvent>;
}

/// Things that happen on a local board which the opponent must hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A settled piece completed this many rows at once.
    LinesCleared(u32),
    /// The next piece could not spawn.
    ToppedOut,
}
