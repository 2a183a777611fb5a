pub mod board;
pub mod client;
pub mod game_trait;
pub mod input;
pub mod net;
pub mod penalty;
pub mod player;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use uuid::Uuid;

    use crate::board::Board;
    use crate::game_trait::{GameEvent, LocalGame};
    use crate::net::messages::{GameUpdateMsg, LinesClearedMsg};
    use crate::player::SessionId;

    /// Board-only stand-in for a real game. Drops settle nothing unless
    /// events were queued in `next_drop`.
    #[derive(Debug, Default)]
    pub struct StubGame {
        pub board: Board,
        pub score: u64,
        pub lines: u64,
        pub over: bool,
        pub next_drop: Vec<GameEvent>,
        pub moves: Vec<i8>,
        pub rotations: u32,
    }

    impl LocalGame for StubGame {
        fn board(&self) -> &Board {
            &self.board
        }
        fn score(&self) -> u64 {
            self.score
        }
        fn lines(&self) -> u64 {
            self.lines
        }
        fn is_game_over(&self) -> bool {
            self.over
        }
        fn move_piece(&mut self, dx: i8) {
            self.moves.push(dx);
        }
        fn drop_piece(&mut self) -> Vec<GameEvent> {
            std::mem::take(&mut self.next_drop)
        }
        fn rotate(&mut self) {
            self.rotations += 1;
        }
        fn add_penalty_lines(&mut self, count: u32) {
            self.board.add_penalty_lines(count);
        }
        fn update(&mut self, _delta_ms: u32) -> Vec<GameEvent> {
            Vec::new()
        }
    }

    /// A `game_update` payload with an empty board.
    pub fn sample_update(game_id: SessionId, score: u64, lines: u64) -> GameUpdateMsg {
        GameUpdateMsg {
            game_id,
            grid: Board::new().to_grid_value(),
            score,
            lines,
        }
    }

    pub fn lines_cleared(game_id: SessionId, line_count: u32) -> LinesClearedMsg {
        LinesClearedMsg {
            game_id,
            line_count,
        }
    }

    /// A session id nobody has been assigned.
    pub fn unknown_session() -> SessionId {
        Uuid::new_v4()
    }
}
