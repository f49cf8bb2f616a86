//! Who simulates what, and who tells whom.
//!
//! Every authority decision (which process enforces expiry, may merge, and
//! where an outgoing message goes) is derived here from the session mode.
//! Nothing else in the crate branches on client/server.

use crate::combatant::{CombatantId, PeerId};
use crate::definition::DurationKind;

/// Role of this process in the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionMode {
    Singleplayer,
    Client { local: PeerId },
    Server,
}

impl SessionMode {
    pub const fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }

    pub const fn is_multiplayer(self) -> bool {
        !matches!(self, Self::Singleplayer)
    }

    /// Whether this process is authoritative for `id`: clients simulate their
    /// own player, the server simulates NPCs, singleplayer simulates everyone.
    pub fn is_local(self, id: CombatantId) -> bool {
        match (self, id) {
            (Self::Singleplayer, _) => true,
            (Self::Client { local }, CombatantId::Player(peer)) => peer == local,
            (Self::Client { .. }, CombatantId::Npc(_)) => false,
            (Self::Server, CombatantId::Player(_)) => false,
            (Self::Server, CombatantId::Npc(_)) => true,
        }
    }

    /// Network identity of this process, `None` in singleplayer.
    pub const fn endpoint(self) -> Option<Endpoint> {
        match self {
            Self::Singleplayer => None,
            Self::Client { local } => Some(Endpoint::Client(local)),
            Self::Server => Some(Endpoint::Server),
        }
    }
}

/// Sender of a network message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    Server,
    Client(PeerId),
}

impl Endpoint {
    pub const fn peer(self) -> Option<PeerId> {
        match self {
            Self::Server => None,
            Self::Client(peer) => Some(peer),
        }
    }
}

/// Destination of an outgoing sync message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recipient {
    /// Client → server.
    Server,
    /// Server → every client, optionally skipping the one the change came from.
    Broadcast { except: Option<PeerId> },
}

impl Recipient {
    pub fn includes(self, peer: PeerId) -> bool {
        match self {
            Self::Server => false,
            Self::Broadcast { except } => except != Some(peer),
        }
    }
}

/// Authority facts about one (owner, target) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Authority {
    pub session: SessionMode,
    pub owner: CombatantId,
    pub owner_local: bool,
    pub target_local: bool,
    pub synced: bool,
    /// Exactly one participant enforces a synced timed expiry: the one
    /// simulating the target. Unsynced instances are only ever local.
    pub enforces_expiry: bool,
}

impl Authority {
    pub fn resolve(
        session: SessionMode,
        owner: CombatantId,
        target: CombatantId,
        synced: bool,
        duration: DurationKind,
    ) -> Self {
        let target_local = session.is_local(target);
        Self {
            session,
            owner,
            owner_local: session.is_local(owner),
            target_local,
            synced,
            enforces_expiry: duration == DurationKind::Timed && (!synced || target_local),
        }
    }

    /// Only the owner's process merges into an existing instance.
    pub fn owns_merge(&self) -> bool {
        self.owner_local
    }

    /// Where an owner-authored change (add, merge, removal) goes.
    ///
    /// `relayed_from` is the client a received message came from; the server
    /// skips it when fanning the change back out.
    pub fn route(&self, relayed_from: Option<PeerId>) -> Option<Recipient> {
        if !self.synced || !self.session.is_multiplayer() {
            return None;
        }
        match self.session {
            SessionMode::Client { .. } if self.owner_local => Some(Recipient::Server),
            SessionMode::Server => {
                let except = relayed_from.or(if self.owner_local {
                    None
                } else {
                    self.owner.peer()
                });
                Some(Recipient::Broadcast { except })
            }
            _ => None,
        }
    }

    /// Where a removal decided by the target's side goes (expiry it enforces,
    /// or the target dismissing the effect) when that side does not own it.
    pub fn target_route(&self) -> Option<Recipient> {
        if !self.synced || !self.target_local {
            return None;
        }
        match self.session {
            SessionMode::Singleplayer => None,
            SessionMode::Client { .. } => Some(Recipient::Server),
            SessionMode::Server => Some(Recipient::Broadcast { except: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: PeerId = PeerId(1);
    const OTHER: PeerId = PeerId(2);
    const CLIENT: SessionMode = SessionMode::Client { local: ME };

    fn player(peer: PeerId) -> CombatantId {
        CombatantId::Player(peer)
    }

    #[test]
    fn locality_follows_session_role() {
        assert!(SessionMode::Singleplayer.is_local(CombatantId::Npc(0)));
        assert!(CLIENT.is_local(player(ME)));
        assert!(!CLIENT.is_local(player(OTHER)));
        assert!(!CLIENT.is_local(CombatantId::Npc(0)));
        assert!(SessionMode::Server.is_local(CombatantId::Npc(0)));
        assert!(!SessionMode::Server.is_local(player(ME)));
    }

    #[test]
    fn client_owner_reports_to_server() {
        let auth = Authority::resolve(CLIENT, player(ME), CombatantId::Npc(3), true, DurationKind::Timed);
        assert!(auth.owns_merge());
        assert!(!auth.enforces_expiry);
        assert_eq!(auth.route(None), Some(Recipient::Server));
    }

    #[test]
    fn server_relays_remote_owner_changes_skipping_the_owner() {
        let auth = Authority::resolve(
            SessionMode::Server,
            player(OTHER),
            player(ME),
            true,
            DurationKind::Timed,
        );
        assert_eq!(
            auth.route(None),
            Some(Recipient::Broadcast { except: Some(OTHER) })
        );
        assert_eq!(
            auth.route(Some(ME)),
            Some(Recipient::Broadcast { except: Some(ME) })
        );
    }

    #[test]
    fn server_owned_changes_reach_everyone() {
        let auth = Authority::resolve(
            SessionMode::Server,
            CombatantId::Npc(1),
            CombatantId::Npc(2),
            true,
            DurationKind::Toggle,
        );
        assert_eq!(auth.route(None), Some(Recipient::Broadcast { except: None }));
        assert!(!auth.enforces_expiry);
    }

    #[test]
    fn unsynced_and_singleplayer_stay_silent() {
        let unsynced = Authority::resolve(CLIENT, player(ME), player(ME), false, DurationKind::Timed);
        assert_eq!(unsynced.route(None), None);
        assert!(unsynced.enforces_expiry);

        let single = Authority::resolve(
            SessionMode::Singleplayer,
            player(ME),
            CombatantId::Npc(0),
            true,
            DurationKind::Timed,
        );
        assert_eq!(single.route(None), None);
        assert_eq!(single.target_route(), None);
    }

    #[test]
    fn non_owning_client_neither_routes_nor_enforces_remote_targets() {
        let auth = Authority::resolve(CLIENT, player(OTHER), CombatantId::Npc(0), true, DurationKind::Timed);
        assert_eq!(auth.route(None), None);
        assert_eq!(auth.target_route(), None);
    }

    #[test]
    fn target_side_enforces_and_reports_expiry() {
        let auth = Authority::resolve(CLIENT, CombatantId::Npc(4), player(ME), true, DurationKind::Timed);
        assert!(auth.enforces_expiry);
        assert_eq!(auth.route(None), None);
        assert_eq!(auth.target_route(), Some(Recipient::Server));
    }

    #[test]
    fn broadcast_exclusion() {
        let broadcast = Recipient::Broadcast { except: Some(OTHER) };
        assert!(broadcast.includes(ME));
        assert!(!broadcast.includes(OTHER));
        assert!(!Recipient::Server.includes(ME));
    }
}
