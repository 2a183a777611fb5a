use stackduel_core::net::messages::ServerEvent;
use stackduel_core::player::{NameError, Participant, ParticipantId, SessionId, normalize_display_name};

use crate::coordinator::Coordinator;
use crate::registry::{ParticipantState, RegistryError};

/// Why a `join_game` was refused. The `Display` text is what the client
/// sees in `join_error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error("Name is already taken")]
    NameTaken,
    #[error("Already waiting for an opponent")]
    AlreadyWaiting,
    #[error("Already in a game")]
    AlreadyInGame,
    #[error("Could not start a game, try again")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Queued; the requester got `waiting_for_player`.
    Waiting,
    /// Paired with the longest-waiting participant.
    Paired(SessionId),
    /// Refused; the requester got `join_error`.
    Rejected(JoinError),
}

impl Coordinator {
    /// Pair the requester with whoever has waited longest, or queue it.
    pub fn handle_join(&mut self, source: ParticipantId, raw_name: &str) -> JoinOutcome {
        match self.try_join(source, raw_name) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::info!(participant_id = source, error = %err, "Join rejected");
                self.send_to(source, &ServerEvent::JoinError(err.to_string()));
                JoinOutcome::Rejected(err)
            },
        }
    }

    fn try_join(&mut self, source: ParticipantId, raw_name: &str) -> Result<JoinOutcome, JoinError> {
        match self.registry.state_of(source) {
            ParticipantState::Idle => {},
            ParticipantState::Waiting => return Err(JoinError::AlreadyWaiting),
            ParticipantState::InSession(_) => return Err(JoinError::AlreadyInGame),
        }
        let name = normalize_display_name(raw_name, self.settings.max_name_len)?;
        if self.registry.contains_name(&name) {
            return Err(JoinError::NameTaken);
        }
        let participant = Participant::new(source, name);

        let Some(opponent) = self.registry.peek_next().cloned() else {
            tracing::info!(participant_id = source, name = %participant.name, "Waiting for opponent");
            self.registry.enqueue(participant);
            self.send_to(source, &ServerEvent::WaitingForPlayer);
            self.broadcast_waiting_list();
            return Ok(JoinOutcome::Waiting);
        };

        let session = self.registry.create_session(opponent, participant)?;
        let session_id = session.id;
        let start = ServerEvent::GameStart(session.start_message());
        let members = session.members().map(|p| p.id);
        tracing::info!(
            session_id = %session_id,
            player1 = %session.first.name,
            player2 = %session.second.name,
            "Session created"
        );

        for member in members {
            self.send_to(member, &start);
        }
        self.broadcast_waiting_list();
        Ok(JoinOutcome::Paired(session_id))
    }
}
