//! Morale, fear and the relative damage efficiency that feeds them.

use crate::config::BattleConfig;
use crate::env::RngOracle;
use crate::state::{Ailments, Combatant};

/// Battlefield situation a monster weighs when deciding to flee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FleeSituation {
    /// Relative damage efficiency, 0..=100.
    pub rde: u32,
    /// Monsters still on the battlefield, including the one deciding.
    pub monsters_on_field: usize,
    pub initial_monsters: usize,
}

/// Party-vs-monster damage ratio scaled so that 50 means parity.
///
/// Both sums are clamped to `1..=0x7fff` before dividing.
pub fn relative_damage_efficiency(party_damage: u32, monster_damage: u32) -> u32 {
    let party = party_damage.clamp(1, BattleConfig::RDE_DAMAGE_CLAMP);
    let monsters = monster_damage.clamp(1, BattleConfig::RDE_DAMAGE_CLAMP);
    (party * BattleConfig::RDE_SCALE / monsters).min(BattleConfig::RDE_MAX)
}

/// Fear of a monster, 0..=100.
pub fn fear(monster: &Combatant, situation: FleeSituation) -> i32 {
    let hit_points = monster.hit_points;
    let low_hp = if hit_points.maximum == 0 {
        0
    } else {
        (hit_points.missing() * BattleConfig::FEAR_LOW_HP_WEIGHT / hit_points.maximum) as i32
    };
    let rde =
        (situation.rde as i32 - BattleConfig::FEAR_RDE_BASELINE) / BattleConfig::FEAR_RDE_DIVISOR;
    let allies = if situation.initial_monsters > 1 {
        (situation.monsters_on_field as i32 - 1) * BattleConfig::FEAR_ALLY_WEIGHT
            / (situation.initial_monsters as i32 - 1)
            - BattleConfig::FEAR_ALLY_OFFSET
    } else {
        0
    };
    (low_hp + rde - allies).clamp(0, 100)
}

/// Whether a monster decides to run this round.
///
/// Bosses never flee, panicked monsters always want to, crazy ones never
/// do. Otherwise a monster whose fear exceeds its morale flees with chance
/// `min(fear - morale, 100)` percent.
pub fn wants_to_flee(
    monster: &Combatant,
    situation: FleeSituation,
    rng: &mut dyn RngOracle,
) -> bool {
    let Some(traits) = monster.monster_traits() else {
        return false;
    };
    if monster.is_boss() {
        return false;
    }
    if monster.ailments.contains(Ailments::PANIC) {
        return true;
    }
    if monster.ailments.contains(Ailments::CRAZY) {
        return false;
    }

    let fear = fear(monster, situation);
    let morale = traits.morale as i32;
    if fear > morale {
        let chance = (fear - morale).min(100);
        return (rng.roll_percent() as i32) < chance;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ScriptedRng;
    use crate::state::{MonsterFlags, MonsterTraits, ResourceMeter};

    fn monster(morale: u32, flags: MonsterFlags, hp: ResourceMeter) -> Combatant {
        let mut monster = Combatant::monster(
            "Ghoul",
            4,
            hp.maximum,
            MonsterTraits {
                morale,
                flags,
                defeat_experience: 10,
            },
        );
        monster.hit_points = hp;
        monster
    }

    fn desperate() -> FleeSituation {
        FleeSituation {
            rde: 100,
            monsters_on_field: 1,
            initial_monsters: 4,
        }
    }

    #[test]
    fn rde_is_fifty_at_parity_and_capped() {
        assert_eq!(relative_damage_efficiency(10, 10), 50);
        assert_eq!(relative_damage_efficiency(0, 0), 50);
        assert_eq!(relative_damage_efficiency(100, 1), 100);
        assert_eq!(relative_damage_efficiency(1, 100), 0);
    }

    #[test]
    fn fear_combines_wounds_rde_and_allies() {
        let wounded = monster(0, MonsterFlags::empty(), ResourceMeter::new(25, 100));
        // 56 + 12 - (-25)
        assert_eq!(fear(&wounded, desperate()), 93);

        let situation = FleeSituation {
            rde: 50,
            monsters_on_field: 4,
            initial_monsters: 4,
        };
        // 56 + 0 - 15
        assert_eq!(fear(&wounded, situation), 41);
    }

    #[test]
    fn single_monster_has_no_ally_term() {
        let healthy = monster(0, MonsterFlags::empty(), ResourceMeter::full(50));
        let alone = FleeSituation {
            rde: 10,
            monsters_on_field: 1,
            initial_monsters: 1,
        };
        assert_eq!(fear(&healthy, alone), 0);
    }

    #[test]
    fn bosses_never_flee() {
        let boss = monster(0, MonsterFlags::BOSS, ResourceMeter::new(1, 1000));
        let mut rng = ScriptedRng::always_min();
        for _ in 0..10 {
            assert!(!wants_to_flee(&boss, desperate(), &mut rng));
        }
        let panicked_boss = boss.with_ailments(Ailments::PANIC);
        assert!(!wants_to_flee(&panicked_boss, desperate(), &mut rng));
    }

    #[test]
    fn panic_always_flees_and_madness_never_does() {
        let hp = ResourceMeter::full(10);
        let mut rng = ScriptedRng::always_max();
        let panicked = monster(100, MonsterFlags::empty(), hp).with_ailments(Ailments::PANIC);
        assert!(wants_to_flee(&panicked, desperate(), &mut rng));
        let crazy = monster(0, MonsterFlags::empty(), ResourceMeter::new(1, 100))
            .with_ailments(Ailments::CRAZY);
        let mut rng = ScriptedRng::always_min();
        assert!(!wants_to_flee(&crazy, desperate(), &mut rng));
    }

    #[test]
    fn flee_chance_is_fear_minus_morale() {
        let wounded = monster(90, MonsterFlags::empty(), ResourceMeter::new(25, 100));
        // fear 93, morale 90 -> chance 3
        let mut low = ScriptedRng::new([2], crate::env::ScriptFallback::Max);
        assert!(wants_to_flee(&wounded, desperate(), &mut low));
        let mut high = ScriptedRng::new([3], crate::env::ScriptFallback::Max);
        assert!(!wants_to_flee(&wounded, desperate(), &mut high));
    }

    #[test]
    fn party_members_are_not_subject_to_morale() {
        let hero = Combatant::party_member("Sabine", 2, 20);
        let mut rng = ScriptedRng::always_min();
        assert!(!wants_to_flee(&hero, desperate(), &mut rng));
    }
}
