//! A server and its clients in one process, connected through a
//! [`SessionHub`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use status_core::{CombatantId, Endpoint, PeerId, Registry, SessionMode, StatusEngine, Timestamp};
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::EventBus;
use crate::hub::SessionHub;
use crate::participant::Participant;
use crate::transport::ChannelTransport;
use crate::world::SimWorld;

pub type LocalParticipant = Participant<SimWorld, ChannelTransport>;

pub struct LocalSession {
    config: RuntimeConfig,
    registry: Arc<Registry>,
    hub: SessionHub,
    events: EventBus,
    /// Combatants present in every participant's world.
    roster: BTreeSet<CombatantId>,
    server: LocalParticipant,
    clients: BTreeMap<PeerId, LocalParticipant>,
}

impl LocalSession {
    /// Upper bound on delivery rounds in [`Self::settle`].
    const MAX_SETTLE_ROUNDS: usize = 16;

    pub fn new(registry: Arc<Registry>, config: RuntimeConfig) -> Result<Self> {
        let mut hub = SessionHub::new();
        let events = EventBus::with_capacity(config.event_buffer_size);
        let server = Self::participant(&registry, &config, &mut hub, &events, SessionMode::Server, SimWorld::new())?;
        Ok(Self {
            config,
            registry,
            hub,
            events,
            roster: BTreeSet::new(),
            server,
            clients: BTreeMap::new(),
        })
    }

    fn participant(
        registry: &Arc<Registry>,
        config: &RuntimeConfig,
        hub: &mut SessionHub,
        events: &EventBus,
        session: SessionMode,
        world: SimWorld,
    ) -> Result<LocalParticipant> {
        let endpoint = session.endpoint().ok_or(RuntimeError::NotNetworked)?;
        let engine = StatusEngine::new(Arc::clone(registry), config.engine.clone(), session);
        Participant::new(engine, world, hub.connect(endpoint), events.clone())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn server(&mut self) -> &mut LocalParticipant {
        &mut self.server
    }

    pub fn client(&mut self, peer: PeerId) -> Result<&mut LocalParticipant> {
        self.clients
            .get_mut(&peer)
            .ok_or(RuntimeError::UnknownPeer { peer })
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.clients.keys().copied()
    }

    /// The server followed by every client.
    pub fn participants(&self) -> impl Iterator<Item = &LocalParticipant> {
        std::iter::once(&self.server).chain(self.clients.values())
    }

    fn for_each(&mut self, mut f: impl FnMut(&mut LocalParticipant) -> Result<()>) -> Result<()> {
        f(&mut self.server)?;
        for client in self.clients.values_mut() {
            f(client)?;
        }
        Ok(())
    }

    /// Adds a combatant to every world, present and future.
    pub fn spawn(&mut self, id: CombatantId) {
        self.roster.insert(id);
        self.server.world_mut().spawn(id);
        for client in self.clients.values_mut() {
            client.world_mut().spawn(id);
        }
    }

    /// Connects a client and spawns its player everywhere. The newcomer starts
    /// without effects; owners publish snapshots to catch it up.
    pub fn join(&mut self, peer: PeerId) -> Result<&mut LocalParticipant> {
        let mut world = SimWorld::new();
        for id in &self.roster {
            world.spawn(*id);
        }
        let client = Self::participant(
            &self.registry,
            &self.config,
            &mut self.hub,
            &self.events,
            SessionMode::Client { local: peer },
            world,
        )?;
        self.clients.insert(peer, client);
        self.spawn(CombatantId::Player(peer));
        info!(%peer, "client joined");
        self.client(peer)
    }

    /// Disconnects a client. Its player turns inactive everywhere, so effects
    /// it owned end on the next tick; effects on it are dropped right away.
    pub fn leave(&mut self, peer: PeerId) -> Result<()> {
        if self.clients.remove(&peer).is_none() {
            return Err(RuntimeError::UnknownPeer { peer });
        }
        self.hub.disconnect(Endpoint::Client(peer));
        let player = CombatantId::Player(peer);
        self.roster.remove(&player);
        self.for_each(|participant| {
            participant.world_mut().despawn(player);
            participant.forget(player);
            Ok(())
        })?;
        info!(%peer, "client left");
        Ok(())
    }

    /// Sends and delivers queued messages until the session is quiet.
    /// Returns the number of envelopes routed.
    pub fn settle(&mut self, now: Timestamp) -> Result<usize> {
        let mut total = 0;
        for _ in 0..Self::MAX_SETTLE_ROUNDS {
            self.for_each(|participant| participant.flush().map(|_| ()))?;
            let routed = self.hub.route_pending();
            if routed == 0 {
                return Ok(total);
            }
            total += routed;
            self.for_each(|participant| {
                participant.receive(now);
                participant.publish_events();
                Ok(())
            })?;
        }
        warn!(total, "session did not settle");
        Ok(total)
    }

    /// One tick on every participant, then delivery until quiet.
    pub fn step(&mut self, now: Timestamp) -> Result<usize> {
        self.for_each(|participant| participant.step(now).map(|_| ()))?;
        self.settle(now)
    }
}
