//! One process's engine, wired to its host world, transport and event bus.

use status_core::{
    AddOutcome, CombatantId, CreateRequest, EffectInstance, EffectKind, Endpoint, InstanceId,
    StatusEngine, Timestamp, World,
};
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus};
use crate::transport::{Envelope, Transport};
use crate::world::SimWorld;

/// Host world with per-tick bookkeeping.
pub trait HostWorld: World {
    /// Runs before every engine tick.
    fn begin_tick(&mut self) {}
}

impl HostWorld for SimWorld {
    fn begin_tick(&mut self) {
        SimWorld::begin_tick(self);
    }
}

/// What one [`Participant::step`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub received: usize,
    /// Received messages the engine refused or that failed to decode.
    pub rejected: usize,
    pub sent: usize,
    pub events: usize,
}

pub struct Participant<W, T> {
    engine: StatusEngine,
    world: W,
    transport: T,
    events: EventBus,
}

impl<W: HostWorld, T: Transport> Participant<W, T> {
    pub fn new(engine: StatusEngine, world: W, transport: T, events: EventBus) -> Result<Self> {
        if engine.session().endpoint().is_none() {
            return Err(RuntimeError::NotNetworked);
        }
        Ok(Self {
            engine,
            world,
            transport,
            events,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.transport.endpoint()
    }

    pub fn engine(&self) -> &StatusEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut StatusEngine {
        &mut self.engine
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn create(&mut self, request: CreateRequest, now: Timestamp) -> Result<AddOutcome> {
        Ok(self.engine.create(request, now, &mut self.world)?)
    }

    pub fn remove(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    ) -> Option<EffectInstance> {
        self.engine.remove(target, kind, instance_id, &mut self.world)
    }

    pub fn hurt(&mut self, combatant: CombatantId) -> bool {
        self.engine
            .remove_channelling_on_hurt(combatant, &mut self.world)
    }

    pub fn end_by_target(
        &mut self,
        target: CombatantId,
        kind: EffectKind,
        instance_id: InstanceId,
    ) -> Result<bool> {
        Ok(self
            .engine
            .end_by_target(target, kind, instance_id, &mut self.world)?)
    }

    pub fn add_auto_passive(
        &mut self,
        kind: EffectKind,
        combatant: CombatantId,
        now: Timestamp,
    ) -> Result<AddOutcome> {
        Ok(self
            .engine
            .add_auto_passive(kind, combatant, now, &mut self.world)?)
    }

    /// Drops a departed combatant's effects on this participant.
    pub fn forget(&mut self, combatant: CombatantId) -> usize {
        self.engine.remove_combatant(combatant, &mut self.world)
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Applies every delivered message. Returns (received, rejected).
    pub fn receive(&mut self, now: Timestamp) -> (usize, usize) {
        let mut received = 0;
        let mut rejected = 0;
        while let Some(envelope) = self.transport.try_recv() {
            received += 1;
            let message = match envelope.open() {
                Ok(message) => message,
                Err(err) => {
                    warn!(from = ?envelope.from, error = %err, "undecodable envelope dropped");
                    rejected += 1;
                    continue;
                }
            };
            // The engine reports its own refusals.
            if self
                .engine
                .handle_message(envelope.from, message, now, &mut self.world)
                .is_err()
            {
                rejected += 1;
            }
        }
        (received, rejected)
    }

    pub fn tick(&mut self, now: Timestamp) {
        self.world.begin_tick();
        self.engine.tick(now, &mut self.world);
    }

    /// Encodes and sends everything the engine queued.
    pub fn flush(&mut self) -> Result<usize> {
        let from = self.endpoint();
        let outbound = self.engine.take_outbound();
        let sent = outbound.len();
        for message in &outbound {
            self.transport.send(Envelope::seal(from, message)?)?;
        }
        Ok(sent)
    }

    /// Moves engine journal entries and presentation signals to the bus.
    pub fn publish_events(&mut self) -> usize {
        let at = self.endpoint();
        let mut published = 0;
        for event in self.engine.take_events() {
            self.events.publish(Event::Lifecycle { at, event });
            published += 1;
        }
        let signals = self.engine.take_signals();
        if !signals.is_empty() {
            self.events.publish(Event::Ui { at, signals });
            published += 1;
        }
        published
    }

    /// Receive, tick, send, publish.
    pub fn step(&mut self, now: Timestamp) -> Result<StepReport> {
        let (received, rejected) = self.receive(now);
        self.tick(now);
        let sent = self.flush()?;
        let events = self.publish_events();
        if rejected > 0 {
            debug!(endpoint = ?self.endpoint(), rejected, "messages rejected this step");
        }
        Ok(StepReport {
            received,
            rejected,
            sent,
            events,
        })
    }
}
