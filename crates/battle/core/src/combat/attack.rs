//! Physical attack resolution.

use crate::combat::{AttackResolution, AttackResult, DamageBuffs, physical_damage};
use crate::env::RngOracle;
use crate::state::{Ailments, Combatant};

/// Situational inputs of one attack that are not stored on the combatants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackContext {
    /// The target is a party member registered as parrying this round.
    pub target_parrying: bool,
    pub buffs: DamageBuffs,
}

/// Resolves a physical attack against whatever stands on the target slot.
///
/// Checks run in a fixed order: empty slot, petrified target, magic
/// protection, attack roll, critical roll, damage, parry.
pub fn resolve_attack(
    attacker: &Combatant,
    target: Option<&Combatant>,
    context: AttackContext,
    rng: &mut dyn RngOracle,
) -> AttackResolution {
    let Some(target) = target else {
        return AttackResolution::aborted(AttackResult::Missed);
    };

    if target.ailments.contains(Ailments::PETRIFIED) {
        return AttackResolution::aborted(AttackResult::Petrified);
    }

    let magic_attack = attacker.combat.magic_attack;
    if magic_attack >= 0 && target.combat.magic_defense > magic_attack {
        return AttackResolution::aborted(AttackResult::Protected);
    }

    if rng.roll_percent() > attacker.abilities.attack {
        return AttackResolution::landed(AttackResult::Failed, 0);
    }

    if rng.roll_percent() < attacker.abilities.critical_hit && !target.is_boss() {
        return AttackResolution::landed(AttackResult::CriticalHit, target.hit_points.current);
    }

    let damage = physical_damage(attacker, target, context.buffs, rng);
    if damage <= 0 {
        return AttackResolution::landed(AttackResult::NoDamage, 0);
    }

    if context.target_parrying
        && target.is_party_member()
        && rng.roll_percent() < target.abilities.parry
    {
        return AttackResolution::landed(AttackResult::Blocked, 0);
    }

    AttackResolution::landed(AttackResult::Damage, damage as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ScriptFallback, ScriptedRng};
    use crate::state::{Abilities, CombatValues, MonsterFlags, MonsterTraits};

    fn attacker() -> Combatant {
        Combatant::party_member("Egil", 5, 40)
            .with_abilities(Abilities {
                attack: 100,
                ..Abilities::default()
            })
            .with_combat(CombatValues {
                base_attack: 20,
                ..CombatValues::default()
            })
    }

    fn orc() -> Combatant {
        Combatant::monster("Orc", 3, 10, MonsterTraits::default()).with_combat(CombatValues {
            base_defense: 5,
            ..CombatValues::default()
        })
    }

    #[test]
    fn empty_slot_is_a_missed_abort() {
        let mut rng = ScriptedRng::always_max();
        let outcome = resolve_attack(&attacker(), None, AttackContext::default(), &mut rng);
        assert_eq!(outcome, AttackResolution::aborted(AttackResult::Missed));
    }

    #[test]
    fn petrified_targets_never_take_damage() {
        let target = orc().with_ailments(Ailments::PETRIFIED);
        let mut rng = ScriptedRng::always_max();
        let outcome = resolve_attack(&attacker(), Some(&target), AttackContext::default(), &mut rng);
        assert_eq!(outcome.result, AttackResult::Petrified);
        assert!(outcome.abort);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn magic_defense_above_weapon_level_protects() {
        let mut target = orc();
        target.combat.magic_defense = 2;
        let mut magic = attacker();
        magic.combat.magic_attack = 1;
        let mut rng = ScriptedRng::always_max();
        let outcome = resolve_attack(&magic, Some(&target), AttackContext::default(), &mut rng);
        assert_eq!(outcome.result, AttackResult::Protected);

        let mut mundane = attacker();
        mundane.combat.magic_attack = -1;
        let outcome = resolve_attack(&mundane, Some(&target), AttackContext::default(), &mut rng);
        assert_eq!(outcome.result, AttackResult::Damage);
    }

    #[test]
    fn attack_roll_above_ability_fails() {
        let mut weak = attacker();
        weak.abilities.attack = 40;
        let mut rng = ScriptedRng::new([41], ScriptFallback::Max);
        let outcome = resolve_attack(&weak, Some(&orc()), AttackContext::default(), &mut rng);
        assert_eq!(outcome, AttackResolution::landed(AttackResult::Failed, 0));
    }

    #[test]
    fn critical_hit_deals_current_hit_points_except_to_bosses() {
        let mut striker = attacker();
        striker.abilities.critical_hit = 10;
        let mut target = orc();
        target.hit_points.current = 7;

        let mut rng = ScriptedRng::new([0, 5], ScriptFallback::Max);
        let outcome = resolve_attack(&striker, Some(&target), AttackContext::default(), &mut rng);
        assert_eq!(outcome, AttackResolution::landed(AttackResult::CriticalHit, 7));

        let boss = Combatant::monster(
            "Tornak",
            30,
            200,
            MonsterTraits {
                flags: MonsterFlags::BOSS,
                ..MonsterTraits::default()
            },
        );
        let mut rng = ScriptedRng::new([0, 5], ScriptFallback::Max);
        let outcome = resolve_attack(&striker, Some(&boss), AttackContext::default(), &mut rng);
        assert_eq!(outcome.result, AttackResult::Damage);
    }

    #[test]
    fn deterministic_max_rolls_deal_fifteen() {
        let mut rng = ScriptedRng::always_max();
        let outcome = resolve_attack(&attacker(), Some(&orc()), AttackContext::default(), &mut rng);
        assert_eq!(outcome, AttackResolution::landed(AttackResult::Damage, 15));
    }

    #[test]
    fn parrying_party_member_blocks_on_a_low_roll() {
        let monster = Combatant::monster("Orc", 3, 10, MonsterTraits::default())
            .with_abilities(Abilities {
                attack: 100,
                ..Abilities::default()
            })
            .with_combat(CombatValues {
                base_attack: 12,
                ..CombatValues::default()
            });
        let defender = Combatant::party_member("Netsrak", 4, 30).with_abilities(Abilities {
            parry: 50,
            ..Abilities::default()
        });
        let context = AttackContext {
            target_parrying: true,
            ..AttackContext::default()
        };
        // attack, critical, percent x2, parry; zero-width variance ranges do not roll
        let mut rng = ScriptedRng::new([0, 99, 100, 100, 10], ScriptFallback::Max);
        let outcome = resolve_attack(&monster, Some(&defender), context, &mut rng);
        assert_eq!(outcome, AttackResolution::landed(AttackResult::Blocked, 0));
    }

    #[test]
    fn armor_that_outweighs_the_blow_reports_no_damage() {
        let mut tank = orc();
        tank.combat.base_defense = 50;
        let mut rng = ScriptedRng::always_max();
        let outcome = resolve_attack(&attacker(), Some(&tank), AttackContext::default(), &mut rng);
        assert_eq!(outcome, AttackResolution::landed(AttackResult::NoDamage, 0));
    }
}
