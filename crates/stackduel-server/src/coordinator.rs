use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use stackduel_core::net::messages::{ClientEvent, ServerEvent};
use stackduel_core::net::protocol::encode_server_event;
use stackduel_core::player::ParticipantId;

use crate::config::MatchmakingConfig;
use crate::matchmaker::JoinOutcome;
use crate::registry::SessionRegistry;
use crate::relay::RelayOutcome;

/// Per-participant sender for outbound WebSocket text frames.
/// Bounded so a slow client loses frames instead of growing memory.
pub type ParticipantSender = mpsc::Sender<Bytes>;

/// What happened as a result of one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Join(JoinOutcome),
    Relay(RelayOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub connections: usize,
    pub waiting: usize,
    pub sessions: usize,
}

/// Owns the session registry and every connected participant's outbound
/// channel. All matchmaking, relay, and teardown goes through here.
///
/// The component operations live next to their concerns: joins in
/// `matchmaker`, forwarding in `relay`, teardown in `lifecycle`.
pub struct Coordinator {
    pub(crate) registry: SessionRegistry,
    connections: HashMap<ParticipantId, ParticipantSender>,
    pub(crate) settings: MatchmakingConfig,
    next_participant_id: ParticipantId,
}

impl Coordinator {
    pub fn new(settings: MatchmakingConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            connections: HashMap::new(),
            settings,
            next_participant_id: 1,
        }
    }

    /// Register a new connection and hand out its participant id.
    pub fn connect(&mut self, sender: ParticipantSender) -> ParticipantId {
        let id = self.next_participant_id;
        self.next_participant_id += 1;
        self.connections.insert(id, sender);
        id
    }

    pub(crate) fn unregister(&mut self, participant: ParticipantId) -> bool {
        self.connections.remove(&participant).is_some()
    }

    pub fn is_connected(&self, participant: ParticipantId) -> bool {
        self.connections.contains_key(&participant)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            connections: self.connections.len(),
            waiting: self.registry.waiting_len(),
            sessions: self.registry.session_count(),
        }
    }

    /// Single entry point for inbound client events.
    pub fn handle_event(&mut self, source: ParticipantId, event: ClientEvent) -> EventOutcome {
        match event {
            ClientEvent::JoinGame(name) => EventOutcome::Join(self.handle_join(source, name.as_str())),
            ClientEvent::GameOver(session_id) => {
                EventOutcome::Relay(self.on_game_over(source, session_id))
            },
            relay => EventOutcome::Relay(self.route_relay(source, relay)),
        }
    }

    /// Forward a pure relay event. Needs only shared access, so callers can
    /// hold a read lock. Membership-changing events are dropped here.
    pub fn route_relay(&self, source: ParticipantId, event: ClientEvent) -> RelayOutcome {
        match event {
            ClientEvent::GameUpdate(update) => self.relay_update(source, update),
            ClientEvent::LinesCleared(cleared) => self.relay_penalty(source, cleared),
            other => {
                tracing::warn!(
                    participant_id = source,
                    event = other.name(),
                    "Session event routed as relay, ignoring"
                );
                RelayOutcome::Dropped
            },
        }
    }

    /// Queue one event for one participant. Returns `false` if the frame
    /// could not be queued.
    pub(crate) fn send_to(&self, participant: ParticipantId, event: &ServerEvent) -> bool {
        let Some(sender) = self.connections.get(&participant) else {
            tracing::debug!(participant_id = participant, event = event.name(), "No connection");
            return false;
        };
        match encode_server_event(event) {
            Ok(data) => deliver(participant, sender, Bytes::from(data), event.name()),
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
                false
            },
        }
    }

    /// Queue one event for every connection. Encodes once.
    pub(crate) fn broadcast(&self, event: &ServerEvent) {
        let data = match encode_server_event(event) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
                return;
            },
        };
        for (&id, sender) in &self.connections {
            deliver(id, sender, data.clone(), event.name());
        }
    }

    /// Push the current queue to everyone, if enabled.
    pub(crate) fn broadcast_waiting_list(&self) {
        if self.settings.broadcast_waiting_list {
            self.broadcast(&ServerEvent::WaitingPlayersUpdate(
                self.registry.waiting_names(),
            ));
        }
    }

    /// Drop every connection and forget all sessions. Writer tasks end once
    /// their channel closes.
    pub fn shutdown(&mut self) {
        let stats = self.stats();
        tracing::info!(
            connections = stats.connections,
            waiting = stats.waiting,
            sessions = stats.sessions,
            "Coordinator shutting down"
        );
        self.connections.clear();
        self.registry.clear();
    }
}

fn deliver(to: ParticipantId, sender: &ParticipantSender, data: Bytes, event: &str) -> bool {
    match sender.try_send(data) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!(participant_id = to, event, "Outbound buffer full, dropping frame");
            false
        },
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(participant_id = to, event, "Connection gone, dropping frame");
            false
        },
    }
}
