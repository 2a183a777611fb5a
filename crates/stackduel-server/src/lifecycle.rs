use stackduel_core::net::messages::ServerEvent;
use stackduel_core::player::{ParticipantId, SessionId};

use crate::coordinator::Coordinator;
use crate::relay::RelayOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Was not queued or playing.
    Idle,
    /// Removed from the waiting queue; nobody was notified.
    LeftQueue,
    /// The session ended and the opponent got `opponent_disconnected`.
    EndedSession(SessionId),
}

impl Coordinator {
    /// The loser reports a top-out: the opponent wins and the session ends.
    /// Repeats for the same session are dropped.
    pub fn on_game_over(&mut self, loser: ParticipantId, session_id: SessionId) -> RelayOutcome {
        let outcome = self.relay_game_over(loser, session_id);
        if let RelayOutcome::Delivered { to } | RelayOutcome::Undeliverable { to } = outcome
            && self.registry.terminate(session_id).is_some()
        {
            tracing::info!(
                session_id = %session_id,
                loser,
                winner = to,
                "Session ended"
            );
        }
        outcome
    }

    /// Clean up after a closed connection. Safe to call more than once.
    pub fn on_disconnect(&mut self, participant: ParticipantId) -> DisconnectOutcome {
        self.unregister(participant);

        if self.registry.remove(participant).is_some() {
            tracing::info!(participant_id = participant, "Left the waiting queue");
            self.broadcast_waiting_list();
            return DisconnectOutcome::LeftQueue;
        }

        let Some(session) = self.registry.find_session_by_participant(participant) else {
            return DisconnectOutcome::Idle;
        };
        let session_id = session.id;
        if let Some(other) = session.other(participant).map(|p| p.id) {
            self.send_to(other, &ServerEvent::OpponentDisconnected);
        }
        self.registry.terminate(session_id);
        tracing::info!(
            session_id = %session_id,
            participant_id = participant,
            "Session ended by disconnect"
        );
        DisconnectOutcome::EndedSession(session_id)
    }
}
