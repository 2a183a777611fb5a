//! Client-side view of one connection to the coordinator.
//!
//! `ClientSession` turns server events into calls on the local game and
//! local game events into the frames the server expects. It holds no
//! transport; callers feed it decoded events and send whatever it returns.

use crate::game_trait::{GameEvent, LocalGame};
use crate::net::messages::{
    ClientEvent, GameStartMsg, GameUpdateMsg, LinesClearedMsg, OpponentUpdateMsg, ServerEvent,
};
use crate::player::SessionId;

/// How a match ended from this client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    OpponentLeft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPhase {
    Idle,
    /// `join_game` sent, no answer yet.
    Joining,
    Waiting,
    Playing(GameStartMsg),
    Finished(Outcome),
}

#[derive(Debug)]
pub struct ClientSession {
    phase: ClientPhase,
    opponent: Option<OpponentUpdateMsg>,
    waiting_players: Vec<String>,
    last_error: Option<String>,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            phase: ClientPhase::Idle,
            opponent: None,
            waiting_players: Vec::new(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> &ClientPhase {
        &self.phase
    }

    pub fn game_id(&self) -> Option<SessionId> {
        match &self.phase {
            ClientPhase::Playing(start) => Some(start.game_id),
            _ => None,
        }
    }

    /// Last known opponent snapshot, if any arrived this match.
    pub fn opponent(&self) -> Option<&OpponentUpdateMsg> {
        self.opponent.as_ref()
    }

    pub fn waiting_players(&self) -> &[String] {
        &self.waiting_players
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Build a join request. Returns `None` while a join is pending or a
    /// match is running, or when the name is blank.
    pub fn join(&mut self, name: &str) -> Option<ClientEvent> {
        if !matches!(self.phase, ClientPhase::Idle | ClientPhase::Finished(_)) {
            return None;
        }
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.phase = ClientPhase::Joining;
        self.last_error = None;
        Some(ClientEvent::JoinGame(name.into()))
    }

    /// Apply one event from the server.
    pub fn handle_server_event<G: LocalGame + ?Sized>(&mut self, event: ServerEvent, game: &mut G) {
        match event {
            ServerEvent::WaitingForPlayer => {
                if self.phase == ClientPhase::Joining {
                    self.phase = ClientPhase::Waiting;
                }
            },
            ServerEvent::WaitingPlayersUpdate(names) => self.waiting_players = names,
            ServerEvent::GameStart(start) => {
                self.opponent = None;
                self.phase = ClientPhase::Playing(start);
            },
            ServerEvent::OpponentUpdate(update) => {
                if self.game_id().is_some() {
                    self.opponent = Some(update);
                }
            },
            ServerEvent::AddPenaltyLines(count) => {
                if self.game_id().is_some() && !game.is_game_over() {
                    game.add_penalty_lines(count);
                }
            },
            ServerEvent::OpponentLost => self.finish(Outcome::Won),
            ServerEvent::OpponentDisconnected => self.finish(Outcome::OpponentLeft),
            ServerEvent::JoinError(message) => {
                tracing::debug!(%message, "Join rejected");
                // Re-enable joining
                self.phase = ClientPhase::Idle;
                self.last_error = Some(message);
            },
        }
    }

    /// Per-frame state snapshot to send while a match is running.
    pub fn snapshot<G: LocalGame + ?Sized>(&self, game: &G) -> Option<ClientEvent> {
        let game_id = self.game_id()?;
        Some(ClientEvent::GameUpdate(GameUpdateMsg {
            game_id,
            grid: game.board().to_grid_value(),
            score: game.score(),
            lines: game.lines(),
        }))
    }

    /// Translate local game events into frames for the server. Clears are
    /// reported raw; the server decides what the opponent receives.
    pub fn handle_game_events(&mut self, events: &[GameEvent]) -> Vec<ClientEvent> {
        let Some(game_id) = self.game_id() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for event in events {
            match *event {
                GameEvent::LinesCleared(line_count) if line_count > 0 => {
                    out.push(ClientEvent::LinesCleared(LinesClearedMsg {
                        game_id,
                        line_count,
                    }));
                },
                GameEvent::LinesCleared(_) => {},
                GameEvent::ToppedOut => {
                    out.push(ClientEvent::GameOver(game_id));
                    self.phase = ClientPhase::Finished(Outcome::Lost);
                    break;
                },
            }
        }
        out
    }

    fn finish(&mut self, outcome: Outcome) {
        if matches!(self.phase, ClientPhase::Playing(_)) {
            self.phase = ClientPhase::Finished(outcome);
        }
    }
}
