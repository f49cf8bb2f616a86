//! Runs a server and two clients in one process for a couple of seconds and
//! prints every participant's view of the shared effects.
//!
//! Set `RUST_LOG=status_core=debug` to follow the sync traffic.

use std::sync::Arc;
use std::time::Duration;

use status_content::ContentFactory;
use status_core::{AbilityId, CombatantId, CreateRequest, EffectKind, HotKey, PeerId, SyncField, Timestamp};
use status_runtime::{LocalSession, RuntimeConfig, TickDriver};
use tracing::info;

const WARRIOR: PeerId = PeerId(1);
const BARD: PeerId = PeerId(2);
const SPIDER: CombatantId = CombatantId::Npc(0);

const BLOCK_ABILITY: AbilityId = AbilityId(10);
const BLOCK_KEY: HotKey = HotKey(1);

const RUN_FOR: Duration = Duration::from_secs(2);
const RELEASE_BLOCK_AT: Timestamp = Timestamp::from_millis(1_000);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let factory = ContentFactory::bundled();
    let registry = Arc::new(factory.load_registry()?);
    let config = RuntimeConfig {
        engine: factory.load_config()?,
        ..RuntimeConfig::default()
    };
    let tick_interval = config.tick_interval;

    let mut session = LocalSession::new(registry, config)?;
    session.spawn(SPIDER);
    session.join(WARRIOR)?;
    session.join(BARD)?;

    let warrior = CombatantId::Player(WARRIOR);
    let bard = CombatantId::Player(BARD);
    let start = Timestamp::ZERO;

    {
        let client = session.client(WARRIOR)?;
        if let Some(me) = client.world_mut().combatant_mut(warrior) {
            me.abilities.push(BLOCK_ABILITY);
        }
        client.world_mut().hold_key(BLOCK_KEY);
        client.create(
            CreateRequest::new(EffectKind::WarriorBlock, warrior, warrior)
                .with_field(SyncField::Magnitude1, 5.0),
            start,
        )?;
        client.create(
            CreateRequest::new(EffectKind::Venom, SPIDER, warrior)
                .with_field(SyncField::Magnitude1, 2.0)
                .with_field(SyncField::Stacks, 1.0),
            start,
        )?;
    }
    session.client(BARD)?.create(
        CreateRequest::new(EffectKind::Rally, warrior, bard)
            .with_field(SyncField::Magnitude1, 3.0)
            .with_field(SyncField::Range, 8.0),
        start,
    )?;
    session.settle(start)?;

    let (driver, shutdown) = TickDriver::new(tick_interval);
    tokio::spawn(async move {
        tokio::time::sleep(RUN_FOR).await;
        shutdown.shutdown();
    });

    let mut released = false;
    let mut last = start;
    let steps = driver
        .run(|now| {
            if !released && now >= RELEASE_BLOCK_AT {
                session.client(WARRIOR)?.world_mut().release_key(BLOCK_KEY);
                info!(%now, "block key released");
                released = true;
            }
            last = now;
            session.step(now).map(|_| ())
        })
        .await?;
    info!(steps, "simulation finished");

    for participant in session.participants() {
        println!("== {:?} ==", participant.endpoint());
        for id in [warrior, bard, SPIDER] {
            if let Some(combatant) = participant.world().combatant(id) {
                println!("  {id}: life {:.1} mana {:.1}", combatant.life, combatant.mana);
            }
        }
        for container in participant.engine().containers() {
            for instance in container.iter() {
                println!(
                    "  {} on {} from {} ({})",
                    instance.kind,
                    container.target(),
                    instance.owner,
                    instance.remaining_label(last),
                );
            }
        }
    }
    Ok(())
}
