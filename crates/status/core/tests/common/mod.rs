//! A server and a set of clients exchanging encoded sync messages in memory.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use status_core::combatant::{AbilityId, Condition, HotKey, PassiveId};
use status_core::sync::{decode, encode};
use status_core::{
    ApplyKind, CombatantId, ConstantEffect, EffectDefinition, EffectError, EffectKind,
    EffectTiming, EngineConfig, Endpoint, LimitKind, PeerId, PeriodicEffect, Recipient, Registry,
    Resource, SessionMode, Stat, StatusEngine, SyncField, SyncMessage, Timestamp, World,
};

pub const P1: CombatantId = CombatantId::Player(PeerId(1));
pub const P2: CombatantId = CombatantId::Player(PeerId(2));
pub const NPC: CombatantId = CombatantId::Npc(0);

/// Permissive host: everyone is alive, able and rich.
#[derive(Debug, Default)]
pub struct QuietWorld {
    pub damage: Vec<(CombatantId, f32)>,
    pub stat_deltas: Vec<(CombatantId, Stat, f32)>,
    pub restored: Vec<(CombatantId, Resource, f32)>,
}

impl World for QuietWorld {
    fn is_active(&self, _: CombatantId) -> bool {
        true
    }

    fn is_dead(&self, _: CombatantId) -> bool {
        false
    }

    fn has_condition(&self, _: CombatantId, _: Condition) -> bool {
        false
    }

    fn has_ability(&self, _: CombatantId, _: AbilityId) -> bool {
        true
    }

    fn has_passive(&self, _: CombatantId, _: PassiveId) -> bool {
        true
    }

    fn key_held(&self, _: HotKey) -> bool {
        true
    }

    fn resource_ratio(&self, _: CombatantId, _: Resource) -> f32 {
        1.0
    }

    fn apply_stat_delta(&mut self, id: CombatantId, stat: Stat, amount: f32) {
        self.stat_deltas.push((id, stat, amount));
    }

    fn spend_resource(&mut self, _: CombatantId, _: Resource, _: f32) -> bool {
        true
    }

    fn restore_resource(&mut self, id: CombatantId, resource: Resource, amount: f32) {
        self.restored.push((id, resource, amount));
    }

    fn apply_damage(&mut self, id: CombatantId, amount: f32) {
        self.damage.push((id, amount));
    }

    fn set_channelling(&mut self, _: CombatantId) {}
}

pub fn registry() -> Registry {
    let venom = EffectDefinition::new(EffectKind::Venom)
        .timed(6.0)
        .timing(EffectTiming::Periodic, 1.0)
        .limit(LimitKind::One)
        .apply(ApplyKind::Best)
        .fields(&[SyncField::Magnitude1, SyncField::Stacks])
        .autostack(5)
        .periodic(PeriodicEffect::DamageOverTime {
            field: SyncField::Magnitude1,
            scale_by_stacks: true,
        });
    let rally = EffectDefinition::timed_constant(EffectKind::Rally, 10.0)
        .fields(&[SyncField::Magnitude1])
        .constant(ConstantEffect::StatBonus {
            stat: Stat::Defense,
            field: SyncField::Magnitude1,
        });

    let mut registry = Registry::new();
    registry.register(venom).expect("venom is valid");
    registry.register(rally).expect("rally is valid");
    registry
}

pub struct Participant {
    pub engine: StatusEngine,
    pub world: QuietWorld,
}

impl Participant {
    fn new(registry: &Arc<Registry>, session: SessionMode) -> Self {
        Self {
            engine: StatusEngine::new(Arc::clone(registry), EngineConfig::default(), session),
            world: QuietWorld::default(),
        }
    }

    pub fn tick(&mut self, now: Timestamp) {
        self.engine.tick(now, &mut self.world);
    }

    pub fn has(&self, target: CombatantId, kind: EffectKind) -> bool {
        self.engine.has_effect(target, kind)
    }
}

pub struct Session {
    registry: Arc<Registry>,
    pub server: Participant,
    pub clients: BTreeMap<PeerId, Participant>,
    pub failures: Vec<EffectError>,
}

impl Session {
    pub fn new(peers: &[u8]) -> Self {
        let registry = Arc::new(registry());
        let server = Participant::new(&registry, SessionMode::Server);
        let mut session = Self {
            registry,
            server,
            clients: BTreeMap::new(),
            failures: Vec::new(),
        };
        for peer in peers {
            session.join(PeerId(*peer));
        }
        session
    }

    pub fn join(&mut self, peer: PeerId) {
        let client = Participant::new(&self.registry, SessionMode::Client { local: peer });
        self.clients.insert(peer, client);
    }

    pub fn client(&mut self, peer: u8) -> &mut Participant {
        self.clients
            .get_mut(&PeerId(peer))
            .expect("client joined the session")
    }

    /// The server followed by every client.
    pub fn everyone(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.server).chain(self.clients.values())
    }

    /// Delivers queued messages until nobody has anything left to send.
    /// Returns the number of messages that crossed the wire.
    pub fn pump(&mut self, now: Timestamp) -> usize {
        let mut delivered = 0;
        loop {
            let mut pending: Vec<(Endpoint, _)> = self
                .server
                .engine
                .take_outbound()
                .into_iter()
                .map(|outbound| (Endpoint::Server, outbound))
                .collect();
            for (peer, client) in &mut self.clients {
                pending.extend(
                    client
                        .engine
                        .take_outbound()
                        .into_iter()
                        .map(|outbound| (Endpoint::Client(*peer), outbound)),
                );
            }
            if pending.is_empty() {
                return delivered;
            }

            for (from, outbound) in pending {
                let bytes = encode(&outbound.message).expect("message encodes");
                let message: SyncMessage = decode(&bytes).expect("message decodes");
                delivered += 1;

                match outbound.recipient {
                    Recipient::Server => {
                        let server = &mut self.server;
                        if let Err(err) = server.engine.handle_message(from, message, now, &mut server.world) {
                            self.failures.push(err);
                        }
                    }
                    recipient @ Recipient::Broadcast { .. } => {
                        for (peer, client) in &mut self.clients {
                            if !recipient.includes(*peer) {
                                continue;
                            }
                            if let Err(err) =
                                client
                                    .engine
                                    .handle_message(from, message.clone(), now, &mut client.world)
                            {
                                self.failures.push(err);
                            }
                        }
                    }
                }
            }
        }
    }
}
