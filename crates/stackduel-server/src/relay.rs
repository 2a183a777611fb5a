use stackduel_core::net::messages::{GameUpdateMsg, LinesClearedMsg, ServerEvent};
use stackduel_core::player::{ParticipantId, SessionId};

use crate::coordinator::Coordinator;

/// Result of forwarding one in-game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued on the opponent's outbound channel.
    Delivered { to: ParticipantId },
    /// The session resolved, but the opponent's channel was full or closed.
    Undeliverable { to: ParticipantId },
    /// Valid session, but the event earns the opponent nothing.
    Suppressed,
    /// Unknown or terminated session, or a sender outside it.
    Dropped,
}

impl Coordinator {
    /// Forward a board snapshot to the other member, minus the session id.
    pub fn relay_update(&self, source: ParticipantId, update: GameUpdateMsg) -> RelayOutcome {
        let Some(to) = self.opponent_of(source, update.game_id, "game_update") else {
            return RelayOutcome::Dropped;
        };
        self.forward(to, &ServerEvent::OpponentUpdate(update.into_opponent_update()))
    }

    /// Turn a clear into penalty rows for the other member, per the
    /// configured policy.
    pub fn relay_penalty(&self, source: ParticipantId, cleared: LinesClearedMsg) -> RelayOutcome {
        let Some(to) = self.opponent_of(source, cleared.game_id, "lines_cleared") else {
            return RelayOutcome::Dropped;
        };
        match self.settings.penalty_policy.penalty_for(cleared.line_count) {
            Some(count) => {
                tracing::debug!(
                    participant_id = source,
                    cleared = cleared.line_count,
                    penalty = count,
                    "Sending penalty lines"
                );
                self.forward(to, &ServerEvent::AddPenaltyLines(count))
            },
            None => RelayOutcome::Suppressed,
        }
    }

    /// Tell the other member it won. Does not end the session; see
    /// `on_game_over`.
    pub fn relay_game_over(&self, source: ParticipantId, session_id: SessionId) -> RelayOutcome {
        let Some(to) = self.opponent_of(source, session_id, "game_over") else {
            return RelayOutcome::Dropped;
        };
        self.forward(to, &ServerEvent::OpponentLost)
    }

    fn forward(&self, to: ParticipantId, event: &ServerEvent) -> RelayOutcome {
        if self.send_to(to, event) {
            RelayOutcome::Delivered { to }
        } else {
            RelayOutcome::Undeliverable { to }
        }
    }

    fn opponent_of(
        &self,
        source: ParticipantId,
        session_id: SessionId,
        event: &'static str,
    ) -> Option<ParticipantId> {
        let Some(session) = self.registry.session(&session_id) else {
            tracing::debug!(participant_id = source, session_id = %session_id, event, "Stale session, dropping");
            return None;
        };
        let other = session.other(source).map(|p| p.id);
        if other.is_none() {
            tracing::debug!(participant_id = source, session_id = %session_id, event, "Sender not in session, dropping");
        }
        other
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use stackduel_core::net::messages::OpponentUpdateMsg;
    use stackduel_core::penalty::PenaltyPolicy;
    use stackduel_core::test_helpers::{lines_cleared, sample_update, unknown_session};

    use super::*;
    use crate::config::MatchmakingConfig;
    use crate::coordinator::test_support::*;
    use crate::matchmaker::JoinOutcome;

    struct Pair {
        coord: Coordinator,
        alice: ParticipantId,
        bob: ParticipantId,
        rx_a: mpsc::Receiver<Bytes>,
        rx_b: mpsc::Receiver<Bytes>,
        game_id: SessionId,
    }

    fn paired(mut coord: Coordinator) -> Pair {
        let (alice, mut rx_a) = connect(&mut coord);
        let (bob, mut rx_b) = connect(&mut coord);
        coord.handle_join(alice, "Alice");
        let JoinOutcome::Paired(game_id) = coord.handle_join(bob, "Bob") else {
            panic!("Expected pairing");
        };
        drain(&mut rx_a);
        drain(&mut rx_b);
        Pair {
            coord,
            alice,
            bob,
            rx_a,
            rx_b,
            game_id,
        }
    }

    #[test]
    fn update_reaches_only_the_opponent_unchanged() {
        let mut p = paired(quiet_coordinator());
        let update = sample_update(p.game_id, 30, 2);

        assert_eq!(
            p.coord.relay_update(p.alice, update.clone()),
            RelayOutcome::Delivered { to: p.bob }
        );
        assert_eq!(
            drain(&mut p.rx_b),
            vec![ServerEvent::OpponentUpdate(OpponentUpdateMsg {
                grid: update.grid,
                score: 30,
                lines: 2,
            })]
        );
        assert!(drain(&mut p.rx_a).is_empty());
    }

    #[test]
    fn updates_flow_both_ways() {
        let mut p = paired(quiet_coordinator());
        p.coord.relay_update(p.bob, sample_update(p.game_id, 10, 0));
        assert_eq!(drain(&mut p.rx_a).len(), 1);
        assert!(drain(&mut p.rx_b).is_empty());
    }

    #[test]
    fn penalty_is_halved_by_default() {
        let mut p = paired(quiet_coordinator());

        assert_eq!(
            p.coord.relay_penalty(p.bob, lines_cleared(p.game_id, 1)),
            RelayOutcome::Suppressed
        );
        assert_eq!(
            p.coord.relay_penalty(p.bob, lines_cleared(p.game_id, 4)),
            RelayOutcome::Delivered { to: p.alice }
        );
        p.coord.relay_penalty(p.bob, lines_cleared(p.game_id, 3));

        assert_eq!(
            drain(&mut p.rx_a),
            vec![
                ServerEvent::AddPenaltyLines(2),
                ServerEvent::AddPenaltyLines(1)
            ]
        );
        assert!(drain(&mut p.rx_b).is_empty());
    }

    #[test]
    fn raw_policy_forwards_clear_count() {
        let mut p = paired(Coordinator::new(MatchmakingConfig {
            broadcast_waiting_list: false,
            penalty_policy: PenaltyPolicy::Raw,
            ..MatchmakingConfig::default()
        }));
        p.coord.relay_penalty(p.alice, lines_cleared(p.game_id, 1));
        assert_eq!(drain(&mut p.rx_b), vec![ServerEvent::AddPenaltyLines(1)]);
    }

    #[test]
    fn unknown_session_is_dropped() {
        let mut p = paired(quiet_coordinator());
        let stale = unknown_session();

        assert_eq!(
            p.coord.relay_update(p.alice, sample_update(stale, 1, 1)),
            RelayOutcome::Dropped
        );
        assert_eq!(
            p.coord.relay_penalty(p.alice, lines_cleared(stale, 4)),
            RelayOutcome::Dropped
        );
        assert_eq!(p.coord.relay_game_over(p.alice, stale), RelayOutcome::Dropped);
        assert!(drain(&mut p.rx_a).is_empty());
        assert!(drain(&mut p.rx_b).is_empty());
    }

    #[test]
    fn outsider_cannot_inject_into_a_session() {
        let mut p = paired(quiet_coordinator());
        let (mallory, mut rx_m) = connect(&mut p.coord);

        assert_eq!(
            p.coord.relay_update(mallory, sample_update(p.game_id, 999, 99)),
            RelayOutcome::Dropped
        );
        assert_eq!(
            p.coord.relay_penalty(mallory, lines_cleared(p.game_id, 4)),
            RelayOutcome::Dropped
        );
        assert!(drain(&mut p.rx_a).is_empty());
        assert!(drain(&mut p.rx_b).is_empty());
        assert!(drain(&mut rx_m).is_empty());
    }

    #[test]
    fn closed_opponent_channel_is_reported() {
        let Pair {
            coord,
            alice,
            bob,
            rx_a: _rx_a,
            rx_b,
            game_id,
        } = paired(quiet_coordinator());
        drop(rx_b);

        assert_eq!(
            coord.relay_update(alice, sample_update(game_id, 5, 0)),
            RelayOutcome::Undeliverable { to: bob }
        );
        assert_eq!(
            coord.relay_penalty(alice, lines_cleared(game_id, 2)),
            RelayOutcome::Undeliverable { to: bob }
        );
        // Nothing to forward, so nothing fails
        assert_eq!(
            coord.relay_penalty(alice, lines_cleared(game_id, 1)),
            RelayOutcome::Suppressed
        );
    }

    #[test]
    fn full_opponent_buffer_is_reported() {
        let mut coord = quiet_coordinator();
        let (alice, _rx_a) = connect_with_capacity(&mut coord, 8);
        let (bob, _rx_b) = connect_with_capacity(&mut coord, 1);
        coord.handle_join(alice, "Alice");
        // Bob's only slot is taken by game_start
        let JoinOutcome::Paired(game_id) = coord.handle_join(bob, "Bob") else {
            panic!("Expected pairing");
        };

        assert_eq!(
            coord.relay_update(alice, sample_update(game_id, 1, 0)),
            RelayOutcome::Undeliverable { to: bob }
        );
    }

    #[test]
    fn game_over_relay_keeps_session_alive() {
        let mut p = paired(quiet_coordinator());
        assert_eq!(
            p.coord.relay_game_over(p.alice, p.game_id),
            RelayOutcome::Delivered { to: p.bob }
        );
        assert_eq!(drain(&mut p.rx_b), vec![ServerEvent::OpponentLost]);
        assert_eq!(p.coord.registry().session_count(), 1);
    }
}
