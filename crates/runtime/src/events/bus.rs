//! Topic-based event bus implementation.

use status_core::{EngineEvent, Endpoint, UiSignals};
use tokio::sync::broadcast;

/// Channels a participant publishes on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Effects starting, merging, ending
    Lifecycle,
    /// Redraw and visual rebuild requests
    Ui,
}

/// Something a participant's engine reported, tagged with the participant.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Lifecycle { at: Endpoint, event: EngineEvent },
    Ui { at: Endpoint, signals: UiSignals },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Lifecycle { .. } => Topic::Lifecycle,
            Event::Ui { .. } => Topic::Ui,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Event::Lifecycle { at, .. } | Event::Ui { at, .. } => *at,
        }
    }
}

/// One broadcast channel per [`Topic`]. Clones share the channels, so every
/// participant of a session can hold its own handle.
#[derive(Clone)]
pub struct EventBus {
    lifecycle: broadcast::Sender<Event>,
    ui: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Each topic buffers up to `capacity` events per lagging subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lifecycle: broadcast::channel(capacity).0,
            ui: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Lifecycle => &self.lifecycle,
            Topic::Ui => &self.ui,
        }
    }

    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            // Nobody listening.
            tracing::trace!(?topic, "event dropped without subscribers");
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use status_core::{CombatantId, EffectKind, InstanceId, PeerId};

    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut lifecycle = bus.subscribe(Topic::Lifecycle);
        let mut ui = bus.subscribe(Topic::Ui);

        let started = Event::Lifecycle {
            at: Endpoint::Client(PeerId(1)),
            event: EngineEvent::Started {
                target: CombatantId::Npc(0),
                owner: CombatantId::Player(PeerId(1)),
                kind: EffectKind::Venom,
                instance_id: InstanceId(0),
            },
        };
        bus.publish(started.clone());

        assert_eq!(lifecycle.recv().await.unwrap(), started);
        assert!(ui.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(1);
        bus.publish(Event::Ui {
            at: Endpoint::Server,
            signals: UiSignals::default(),
        });
    }
}
