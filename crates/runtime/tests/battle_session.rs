use std::path::PathBuf;
use std::sync::Arc;

use battle_content::ContentFactory;
use battle_core::{
    Abilities, Attributes, BattleConfig, BattleSetup, CombatValues, Combatant, CombatantId,
    MonsterTraits, ScriptFallback, ScriptedRng, Slot,
};
use battle_runtime::{
    AutoPartyProvider, BattleRuntime, Event, ItemOracleImpl, OracleManager, ParryProvider,
    PartyProvider, RoundStatus, RuntimeConfig, RuntimeError, SessionEvent, SpellOracleImpl, Topic,
};

const ORC: CombatantId = CombatantId(1);

fn hero() -> Combatant {
    Combatant::party_member("Hero", 5, 40)
        .with_attributes(Attributes {
            speed: 50,
            ..Attributes::default()
        })
        .with_abilities(Abilities {
            attack: 100,
            ..Abilities::default()
        })
        .with_combat(CombatValues {
            base_attack: 40,
            ..CombatValues::default()
        })
}

fn orc() -> Combatant {
    Combatant::monster(
        "Orc",
        3,
        20,
        MonsterTraits {
            morale: 50,
            defeat_experience: 25,
            ..MonsterTraits::default()
        },
    )
    .with_attributes(Attributes {
        speed: 10,
        ..Attributes::default()
    })
    .with_abilities(Abilities {
        attack: 100,
        ..Abilities::default()
    })
    .with_combat(CombatValues {
        base_attack: 5,
        ..CombatValues::default()
    })
}

fn duel() -> BattleSetup {
    BattleSetup::new()
        .with_party_member(hero(), 1)
        .with_monster(orc(), Slot::new(13).unwrap())
}

fn empty_oracles() -> OracleManager {
    OracleManager::new(
        Arc::new(ItemOracleImpl::new()),
        Arc::new(SpellOracleImpl::new(Vec::new())),
    )
}

fn scripted() -> Box<ScriptedRng> {
    Box::new(ScriptedRng::new([15], ScriptFallback::Min))
}

fn bundled_content() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../battle/content/data"))
}

#[tokio::test]
async fn auto_party_wins_a_duel() {
    let oracles = empty_oracles();
    let mut runtime = BattleRuntime::builder()
        .setup(duel())
        .oracles(oracles.clone())
        .rng(scripted())
        .party_provider(AutoPartyProvider::new(oracles.items()))
        .build()
        .await
        .unwrap();
    let mut session = runtime.handle().subscribe(Topic::Session);

    let report = runtime.step().await.unwrap();

    let RoundStatus::Ended(end) = report.status else {
        panic!("expected the duel to end, got {:?}", report.status);
    };
    assert!(end.monsters_defeated);
    assert_eq!(end.killed_monsters, vec![ORC]);
    assert_eq!(end.total_experience, 25);
    assert!(report
        .messages
        .contains(&"Hero did 20 points of damage".to_string()));

    let mut ended = false;
    while let Ok(event) = session.try_recv() {
        if let Event::Session(SessionEvent::Ended(info)) = event {
            assert_eq!(info, end);
            ended = true;
        }
    }
    assert!(ended);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn click_gate_waits_for_the_client() {
    let config = RuntimeConfig {
        battle: BattleConfig::default().with_click_gate(true),
        auto_click: false,
        ..RuntimeConfig::default()
    };
    let oracles = empty_oracles();
    let runtime = BattleRuntime::builder()
        .config(config)
        .setup(duel())
        .oracles(oracles.clone())
        .rng(scripted())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let provider = AutoPartyProvider::new(oracles.items());
    let snapshot = handle.snapshot().await.unwrap();
    let plans = provider.plan_round(&snapshot).await.unwrap();
    let report = handle.play_round(plans.clone()).await.unwrap();
    assert_eq!(report.status, RoundStatus::AwaitingClick);
    assert!(matches!(
        handle.play_round(plans).await,
        Err(RuntimeError::AwaitingClick)
    ));

    let mut status = report.status;
    for _ in 0..20 {
        if matches!(status, RoundStatus::Ended(_)) {
            break;
        }
        status = handle.click().await.unwrap().status;
    }
    assert!(matches!(status, RoundStatus::Ended(ref end) if end.monsters_defeated));

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn snapshot_reflects_the_setup() {
    let runtime = BattleRuntime::builder()
        .setup(duel())
        .oracles(empty_oracles())
        .party_provider(ParryProvider)
        .build()
        .await
        .unwrap();
    let snapshot = runtime.handle().snapshot().await.unwrap();

    assert_eq!(snapshot.round, 0);
    assert_eq!(snapshot.party, vec![CombatantId(0)]);
    assert_eq!(snapshot.slot_of(ORC), Slot::new(13));
    assert_eq!(snapshot.monsters().count(), 1);
    assert!(!snapshot.can_advance_row);
    assert!(snapshot.ended.is_none());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn builder_requires_a_setup() {
    let result = BattleRuntime::builder().oracles(empty_oracles()).build().await;
    assert!(matches!(result, Err(RuntimeError::MissingSetup)));
}

#[tokio::test]
async fn bundled_encounter_plays_to_the_end() {
    let factory = bundled_content();
    let oracles = OracleManager::from_content(&factory).unwrap();
    let config = RuntimeConfig {
        battle: factory.load_config().unwrap(),
        seed: 7,
        ..RuntimeConfig::default()
    };
    let mut runtime = BattleRuntime::builder()
        .config(config)
        .setup(factory.load_setup("crossroads").unwrap())
        .oracles(oracles.clone())
        .party_provider(AutoPartyProvider::new(oracles.items()))
        .build()
        .await
        .unwrap();

    let end = runtime.run_to_end().await.unwrap();
    assert!(end.killed_monsters.len() <= 4);
    if end.monsters_defeated {
        assert!(end.total_experience > 0);
    } else {
        assert_eq!(end.total_experience, 0);
    }
    let summary = serde_json::to_value(&end).unwrap();
    assert!(summary.get("killed_monsters").is_some());

    runtime.shutdown().await.unwrap();
}
