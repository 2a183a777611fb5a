use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use uuid::Uuid;

use stackduel_core::net::messages::GameStartMsg;
use stackduel_core::player::{Participant, ParticipantId, SessionId};

/// Where a participant currently sits in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    /// Connected but neither queued nor playing.
    Idle,
    Waiting,
    InSession(SessionId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("participant {0} is already in a session")]
    AlreadyInSession(ParticipantId),
    #[error("a session needs two distinct participants")]
    SameParticipant,
}

/// An active two-player game. `first` joined the queue earlier.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub first: Participant,
    pub second: Participant,
    pub created_at: Instant,
}

impl Session {
    /// The member that is not `participant`, or `None` if `participant` is
    /// not in this session at all.
    pub fn other(&self, participant: ParticipantId) -> Option<&Participant> {
        if self.first.id == participant {
            Some(&self.second)
        } else if self.second.id == participant {
            Some(&self.first)
        } else {
            None
        }
    }

    pub fn members(&self) -> [&Participant; 2] {
        [&self.first, &self.second]
    }

    /// The `game_start` payload both members receive.
    pub fn start_message(&self) -> GameStartMsg {
        GameStartMsg {
            game_id: self.id,
            player1: self.first.name.clone(),
            player2: self.second.name.clone(),
        }
    }
}

/// Waiting queue plus the table of live sessions.
///
/// Pure bookkeeping: nothing in here talks to a connection. A participant is
/// at most once in the queue and never both queued and in a session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    queue: VecDeque<Participant>,
    queued: HashSet<ParticipantId>,
    sessions: HashMap<SessionId, Session>,
    /// participant -> the session it belongs to
    membership: HashMap<ParticipantId, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back of the queue. Returns `false` without changing
    /// anything if the participant is already queued or playing.
    pub fn enqueue(&mut self, participant: Participant) -> bool {
        if self.queued.contains(&participant.id) || self.membership.contains_key(&participant.id) {
            return false;
        }
        self.queued.insert(participant.id);
        self.queue.push_back(participant);
        true
    }

    /// Longest-waiting participant, without removing it.
    pub fn peek_next(&self) -> Option<&Participant> {
        self.queue.front()
    }

    /// Remove and return the longest-waiting participant.
    pub fn dequeue_next(&mut self) -> Option<Participant> {
        let participant = self.queue.pop_front()?;
        self.queued.remove(&participant.id);
        Some(participant)
    }

    /// Take a participant out of the queue, wherever it sits.
    pub fn remove(&mut self, participant: ParticipantId) -> Option<Participant> {
        if !self.queued.remove(&participant) {
            return None;
        }
        let pos = self.queue.iter().position(|p| p.id == participant)?;
        self.queue.remove(pos)
    }

    /// Pair two participants under a fresh session id. Either of them may
    /// still be queued; both leave the queue on success.
    pub fn create_session(
        &mut self,
        first: Participant,
        second: Participant,
    ) -> Result<&Session, RegistryError> {
        if first.id == second.id {
            return Err(RegistryError::SameParticipant);
        }
        for id in [first.id, second.id] {
            if self.membership.contains_key(&id) {
                return Err(RegistryError::AlreadyInSession(id));
            }
        }
        self.remove(first.id);
        self.remove(second.id);

        let mut id = Uuid::new_v4();
        while self.sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }
        self.membership.insert(first.id, id);
        self.membership.insert(second.id, id);
        let session = self.sessions.entry(id).or_insert(Session {
            id,
            first,
            second,
            created_at: Instant::now(),
        });
        Ok(session)
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn find_session_by_participant(&self, participant: ParticipantId) -> Option<&Session> {
        self.membership
            .get(&participant)
            .and_then(|id| self.sessions.get(id))
    }

    /// Remove a session and both membership entries. Unknown or already
    /// terminated ids return `None`.
    pub fn terminate(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        for member in session.members() {
            self.membership.remove(&member.id);
        }
        Some(session)
    }

    pub fn state_of(&self, participant: ParticipantId) -> ParticipantState {
        if let Some(&id) = self.membership.get(&participant) {
            ParticipantState::InSession(id)
        } else if self.queued.contains(&participant) {
            ParticipantState::Waiting
        } else {
            ParticipantState::Idle
        }
    }

    /// Names in the queue, oldest first.
    pub fn waiting_names(&self) -> Vec<String> {
        self.queue.iter().map(|p| p.name.clone()).collect()
    }

    pub fn waiting_len(&self) -> usize {
        self.queue.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether a queued or playing participant already uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.queue.iter().any(|p| p.name == name)
            || self
                .sessions
                .values()
                .any(|s| s.members().iter().any(|p| p.name == name))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
        self.sessions.clear();
        self.membership.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: ParticipantId, name: &str) -> Participant {
        Participant::new(id, name)
    }

    #[test]
    fn enqueue_is_idempotent() {
        let mut reg = SessionRegistry::new();
        assert!(reg.enqueue(p(1, "Alice")));
        assert!(!reg.enqueue(p(1, "Alice")));
        assert_eq!(reg.waiting_len(), 1);
    }

    #[test]
    fn dequeue_is_fifo() {
        let mut reg = SessionRegistry::new();
        reg.enqueue(p(1, "Alice"));
        reg.enqueue(p(2, "Bob"));
        reg.enqueue(p(3, "Carol"));

        assert_eq!(reg.dequeue_next().map(|p| p.id), Some(1));
        assert_eq!(reg.dequeue_next().map(|p| p.id), Some(2));
        assert_eq!(reg.dequeue_next().map(|p| p.id), Some(3));
        assert!(reg.dequeue_next().is_none());
    }

    #[test]
    fn remove_from_middle_keeps_order() {
        let mut reg = SessionRegistry::new();
        reg.enqueue(p(1, "Alice"));
        reg.enqueue(p(2, "Bob"));
        reg.enqueue(p(3, "Carol"));

        assert_eq!(reg.remove(2).map(|p| p.name), Some("Bob".to_string()));
        assert!(reg.remove(2).is_none());
        assert_eq!(reg.waiting_names(), vec!["Alice", "Carol"]);
        assert_eq!(reg.state_of(2), ParticipantState::Idle);
    }

    #[test]
    fn create_session_indexes_both_members() {
        let mut reg = SessionRegistry::new();
        reg.enqueue(p(1, "Alice"));
        let id = reg.create_session(p(1, "Alice"), p(2, "Bob")).unwrap().id;

        assert_eq!(reg.waiting_len(), 0);
        assert_eq!(reg.session_count(), 1);
        assert_eq!(reg.find_session_by_participant(1).map(|s| s.id), Some(id));
        assert_eq!(reg.find_session_by_participant(2).map(|s| s.id), Some(id));
        assert_eq!(reg.state_of(1), ParticipantState::InSession(id));

        let session = reg.session(&id).unwrap();
        assert_eq!(session.other(1).map(|p| p.id), Some(2));
        assert_eq!(session.other(2).map(|p| p.id), Some(1));
        assert!(session.other(3).is_none());
        let start = session.start_message();
        assert_eq!(start.player1, "Alice");
        assert_eq!(start.player2, "Bob");
    }

    #[test]
    fn session_ids_are_unique() {
        let mut reg = SessionRegistry::new();
        let a = reg.create_session(p(1, "A"), p(2, "B")).unwrap().id;
        let b = reg.create_session(p(3, "C"), p(4, "D")).unwrap().id;
        assert_ne!(a, b);
    }

    #[test]
    fn create_session_rejects_busy_or_duplicate_members() {
        let mut reg = SessionRegistry::new();
        reg.create_session(p(1, "Alice"), p(2, "Bob")).unwrap();

        assert_eq!(
            reg.create_session(p(1, "Alice"), p(3, "Carol")).err(),
            Some(RegistryError::AlreadyInSession(1))
        );
        assert_eq!(
            reg.create_session(p(4, "Dan"), p(4, "Dan")).err(),
            Some(RegistryError::SameParticipant)
        );
        assert_eq!(reg.session_count(), 1);
    }

    #[test]
    fn in_session_participant_cannot_be_queued() {
        let mut reg = SessionRegistry::new();
        reg.create_session(p(1, "Alice"), p(2, "Bob")).unwrap();
        assert!(!reg.enqueue(p(1, "Alice")));
        assert_eq!(reg.waiting_len(), 0);
    }

    #[test]
    fn terminate_clears_membership_and_is_idempotent() {
        let mut reg = SessionRegistry::new();
        let id = reg.create_session(p(1, "Alice"), p(2, "Bob")).unwrap().id;

        assert!(reg.terminate(id).is_some());
        assert!(reg.terminate(id).is_none());
        assert!(reg.terminate(Uuid::new_v4()).is_none());
        assert!(reg.find_session_by_participant(1).is_none());
        assert_eq!(reg.state_of(2), ParticipantState::Idle);
        // Former members may queue again
        assert!(reg.enqueue(p(1, "Alice")));
    }

    #[test]
    fn names_cover_queue_and_sessions() {
        let mut reg = SessionRegistry::new();
        reg.enqueue(p(1, "Alice"));
        reg.create_session(p(2, "Bob"), p(3, "Carol")).unwrap();

        assert!(reg.contains_name("Alice"));
        assert!(reg.contains_name("Carol"));
        assert!(!reg.contains_name("Dan"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn repeated_enqueue_counts_each_participant_once(
                ids in proptest::collection::vec(0u64..20, 0..100)
            ) {
                let mut reg = SessionRegistry::new();
                for &id in &ids {
                    reg.enqueue(p(id, &format!("p{id}")));
                }
                let distinct: HashSet<_> = ids.iter().collect();
                prop_assert_eq!(reg.waiting_len(), distinct.len());

                // First appearance order is preserved
                let mut seen = HashSet::new();
                let expected: Vec<u64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
                let mut drained = Vec::new();
                while let Some(next) = reg.dequeue_next() {
                    drained.push(next.id);
                }
                prop_assert_eq!(drained, expected);
            }
        }
    }
}
