//! Damage formulas.

use crate::config::BattleConfig;
use crate::env::RngOracle;
use crate::state::Combatant;

/// Active buff levels relevant to one physical attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageBuffs {
    /// Attack buff of the attacker's side.
    pub attack: u32,
    /// Protection buff of the defender's side.
    pub protection: u32,
}

fn scale_by_buff(value: i32, level: u32) -> i32 {
    if value > 0 {
        (value * (100 + level as i32)) / 100
    } else {
        value
    }
}

/// Physical damage of one hit; zero or negative means no damage.
///
/// Rolls, in order: attacker variance, defender variance, attacker percent,
/// defender percent.
pub fn physical_damage(
    attacker: &Combatant,
    defender: &Combatant,
    buffs: DamageBuffs,
    rng: &mut dyn RngOracle,
) -> i32 {
    let attack = &attacker.combat;
    let defense = &defender.combat;

    let damage = attack.base_attack
        + rng.random_int(0, attack.variable_attack.max(0))
        + attacker.attributes.strength as i32 / BattleConfig::STRENGTH_DAMAGE_DIVISOR;
    let protection = defense.base_defense
        + rng.random_int(0, defense.variable_defense.max(0))
        + defender.attributes.stamina as i32 / BattleConfig::STRENGTH_DAMAGE_DIVISOR;

    let damage = scale_by_buff(damage, buffs.attack);
    let protection = scale_by_buff(protection, buffs.protection);

    let damage_roll = rng.random_int(BattleConfig::DAMAGE_ROLL_MIN, BattleConfig::DAMAGE_ROLL_MAX);
    let protection_roll =
        rng.random_int(BattleConfig::DAMAGE_ROLL_MIN, BattleConfig::DAMAGE_ROLL_MAX);
    (damage_roll * damage) / 100 - (protection_roll * protection) / 100
}

/// Spell damage; never below 1.
pub fn spell_damage(base: u32, variable: u32, rng: &mut dyn RngOracle) -> u32 {
    let variance = rng.random_int(0, variable.min(i32::MAX as u32) as i32) as u32;
    (base + variance).max(1)
}
