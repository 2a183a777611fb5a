use serde::{Deserialize, Serialize};

use crate::game_trait::{GameEvent, LocalGame};

/// Player intent produced by the keyboard layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
}

impl Command {
    /// Map a DOM-style key code (arrow keys) to a command.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            37 => Some(Self::MoveLeft),
            39 => Some(Self::MoveRight),
            40 => Some(Self::SoftDrop),
            38 => Some(Self::Rotate),
            _ => None,
        }
    }

    /// Apply the command to a local game. Only a soft drop can settle a
    /// piece, so it is the only command that yields events.
    pub fn apply<G: LocalGame + ?Sized>(self, game: &mut G) -> Vec<GameEvent> {
        if game.is_game_over() {
            return Vec::new();
        }
        match self {
            Self::MoveLeft => {
                game.move_piece(-1);
                Vec::new()
            },
            Self::MoveRight => {
                game.move_piece(1);
                Vec::new()
            },
            Self::SoftDrop => game.drop_piece(),
            Self::Rotate => {
                game.rotate();
                Vec::new()
            },
        }
    }
}
