use std::sync::Arc;
use std::time::Duration;

use status_content::{ContentFactory, builtin_registry};
use status_core::{
    AbilityId, CombatantId, CreateRequest, EffectKind, Endpoint, EngineEvent, HotKey, PeerId,
    SyncField, Timestamp,
};
use status_runtime::{Event, LocalSession, RuntimeConfig, RuntimeError, TickDriver, Topic};

const WARRIOR: PeerId = PeerId(1);
const BARD: PeerId = PeerId(2);
const SPIDER: CombatantId = CombatantId::Npc(0);

fn session() -> LocalSession {
    let registry = Arc::new(builtin_registry().expect("built-in table should load"));
    let mut session =
        LocalSession::new(registry, RuntimeConfig::default()).expect("session should start");
    session.spawn(SPIDER);
    session.join(WARRIOR).expect("warrior should join");
    session.join(BARD).expect("bard should join");
    session
}

fn venom(owner: PeerId) -> CreateRequest {
    CreateRequest::new(EffectKind::Venom, SPIDER, CombatantId::Player(owner))
        .with_field(SyncField::Magnitude1, 2.0)
        .with_field(SyncField::Stacks, 1.0)
}

fn everyone_has(session: &LocalSession, target: CombatantId, kind: EffectKind) -> bool {
    session
        .participants()
        .all(|participant| participant.engine().has_effect(target, kind))
}

fn nobody_has(session: &LocalSession, target: CombatantId, kind: EffectKind) -> bool {
    session
        .participants()
        .all(|participant| !participant.engine().has_effect(target, kind))
}

/// Three participants sharing a fight:
/// 1. A server and two clients join, and an NPC is spawned everywhere
/// 2. The warrior starts blocking and poisons the NPC, the bard rallies the warrior
/// 3. One tick runs; only the server damages its NPC
/// 4. The warrior releases the block key and the block ends everywhere
/// 5. The bard leaves
#[tokio::test]
async fn test_shared_fight_scenario() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  STATUS EFFECTS - Shared Fight Scenario Test");
    println!("════════════════════════════════════════════════════════\n");

    // ================================================================
    // PHASE 1: Session setup
    // ================================================================
    println!("PHASE 1: Server, two clients and a spider");
    println!("─────────────────────────────────────────────────────\n");

    let mut session = session();
    let warrior = CombatantId::Player(WARRIOR);
    let mut lifecycle = session.events().subscribe(Topic::Lifecycle);
    assert_eq!(session.peers().collect::<Vec<_>>(), vec![WARRIOR, BARD]);
    println!("✓ Session started with {} participants\n", session.participants().count());

    // ================================================================
    // PHASE 2: Effects are cast and replicated
    // ================================================================
    println!("PHASE 2: Casting");
    println!("─────────────────────────────────────────────────────\n");

    let start = Timestamp::ZERO;
    {
        let client = session.client(WARRIOR).expect("warrior is connected");
        let me = client
            .world_mut()
            .combatant_mut(warrior)
            .expect("warrior is spawned");
        me.abilities.push(AbilityId(10));
        client.world_mut().hold_key(HotKey(1));
        client
            .create(
                CreateRequest::new(EffectKind::WarriorBlock, warrior, warrior)
                    .with_field(SyncField::Magnitude1, 5.0),
                start,
            )
            .expect("block should start");
        client.create(venom(WARRIOR), start).expect("venom should land");
    }
    session
        .client(BARD)
        .expect("bard is connected")
        .create(
            CreateRequest::new(EffectKind::Rally, warrior, CombatantId::Player(BARD))
                .with_field(SyncField::Magnitude1, 3.0)
                .with_field(SyncField::Range, 8.0),
            start,
        )
        .expect("rally should land");

    let routed = session.settle(start).expect("session should settle");
    println!("✓ {routed} envelopes routed");
    // Three adds to the server, each relayed to the one other client.
    assert_eq!(routed, 6);
    assert!(everyone_has(&session, warrior, EffectKind::WarriorBlock));
    assert!(everyone_has(&session, warrior, EffectKind::Rally));
    assert!(everyone_has(&session, SPIDER, EffectKind::Venom));

    let mut started = Vec::new();
    while let Ok(event) = lifecycle.try_recv() {
        if let Event::Lifecycle {
            at,
            event: EngineEvent::Started { kind, .. },
        } = event
        {
            started.push((at, kind));
        }
    }
    // Every effect starts once on each of the three participants.
    assert_eq!(started.len(), 9);
    assert!(started.contains(&(Endpoint::Server, EffectKind::Venom)));
    assert!(started.contains(&(Endpoint::Client(BARD), EffectKind::WarriorBlock)));
    println!("✓ Lifecycle events: {started:?}\n");

    // ================================================================
    // PHASE 3: First tick
    // ================================================================
    println!("PHASE 3: First tick");
    println!("─────────────────────────────────────────────────────\n");

    session.step(start).expect("step should succeed");
    let server_spider = session
        .server()
        .world()
        .combatant(SPIDER)
        .expect("spider on server")
        .life;
    assert!(server_spider < 100.0, "server simulates its NPC");
    for peer in [WARRIOR, BARD] {
        let client = session.client(peer).expect("connected");
        let spider = client.world().combatant(SPIDER).expect("spider on client");
        assert_eq!(spider.life, 100.0, "clients leave the NPC to the server");
    }
    println!("✓ Spider life on server: {server_spider:.1}\n");

    // ================================================================
    // PHASE 4: Block released
    // ================================================================
    println!("PHASE 4: Block key released");
    println!("─────────────────────────────────────────────────────\n");

    session
        .client(WARRIOR)
        .expect("connected")
        .world_mut()
        .release_key(HotKey(1));
    session.step(Timestamp::from_millis(100)).expect("step should succeed");
    assert!(nobody_has(&session, warrior, EffectKind::WarriorBlock));
    assert!(everyone_has(&session, warrior, EffectKind::Rally));
    println!("✓ Block ended on every participant\n");

    // ================================================================
    // PHASE 5: The bard leaves
    // ================================================================
    println!("PHASE 5: Bard leaves");
    println!("─────────────────────────────────────────────────────\n");

    session.leave(BARD).expect("bard should leave");
    assert!(matches!(
        session.client(BARD),
        Err(RuntimeError::UnknownPeer { peer }) if peer == BARD
    ));
    assert_eq!(session.participants().count(), 2);
    println!("✓ Bard disconnected\n");
}

#[tokio::test]
async fn effects_on_a_departed_player_are_dropped() {
    let mut session = session();
    let bard = CombatantId::Player(BARD);
    session
        .client(WARRIOR)
        .expect("connected")
        .create(
            CreateRequest::new(EffectKind::Rally, bard, CombatantId::Player(WARRIOR))
                .with_field(SyncField::Magnitude1, 3.0),
            Timestamp::ZERO,
        )
        .expect("rally should land");
    session.settle(Timestamp::ZERO).expect("settle");
    assert!(everyone_has(&session, bard, EffectKind::Rally));

    session.leave(BARD).expect("bard should leave");
    assert!(nobody_has(&session, bard, EffectKind::Rally));
    assert!(session.leave(BARD).is_err());
}

#[tokio::test]
async fn late_joiner_catches_up_from_a_snapshot() {
    let mut session = session();
    session
        .client(WARRIOR)
        .expect("connected")
        .create(venom(WARRIOR), Timestamp::ZERO)
        .expect("venom should land");
    session.settle(Timestamp::ZERO).expect("settle");

    let rogue = PeerId(3);
    session.join(rogue).expect("rogue should join");
    assert!(
        !session
            .client(rogue)
            .expect("connected")
            .engine()
            .has_effect(SPIDER, EffectKind::Venom)
    );

    // The server owns the spider's effect list.
    let now = Timestamp::from_millis(2_000);
    assert!(session.server().engine_mut().publish_snapshot(SPIDER, now));
    session.settle(now).expect("settle");
    assert!(everyone_has(&session, SPIDER, EffectKind::Venom));
}

#[tokio::test]
async fn driver_runs_the_session_until_shutdown() {
    let mut session = session();
    session
        .client(WARRIOR)
        .expect("connected")
        .create(venom(WARRIOR), Timestamp::ZERO)
        .expect("venom should land");

    let (driver, shutdown) = TickDriver::new(Duration::from_millis(5));
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.shutdown();
    });
    let steps = driver
        .run(|now| session.step(now).map(|_| ()))
        .await
        .expect("driver should stop cleanly");

    assert!(steps > 0);
    assert!(everyone_has(&session, SPIDER, EffectKind::Venom));
}

#[tokio::test]
async fn session_runs_on_content_loaded_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("engine.toml"), "container_capacity = 4\n").expect("write");
    std::fs::write(
        dir.path().join("effects.ron"),
        status_content::catalog::BUILTIN_EFFECTS,
    )
    .expect("write");

    let factory = ContentFactory::new(dir.path());
    let config = RuntimeConfig {
        engine: factory.load_config().expect("config should load"),
        ..RuntimeConfig::default()
    };
    assert_eq!(config.engine.container_capacity, 4);
    let registry = Arc::new(factory.load_registry().expect("registry should load"));

    let mut session = LocalSession::new(registry, config).expect("session should start");
    session.spawn(SPIDER);
    session.join(WARRIOR).expect("warrior should join");
    session
        .client(WARRIOR)
        .expect("connected")
        .create(venom(WARRIOR), Timestamp::ZERO)
        .expect("venom should land");
    session.settle(Timestamp::ZERO).expect("settle");
    assert!(everyone_has(&session, SPIDER, EffectKind::Venom));
}
