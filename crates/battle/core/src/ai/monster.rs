//! Monster action choice.

use tracing::{debug, warn};

use crate::action::{AttackParam, BattleActionKind, CastSpellParam, MoveParam, PlannedAction};
use crate::ai::PlanningContext;
use crate::ai::range::ranged_attack;
use crate::combat::{FleeSituation, wants_to_flee};
use crate::config::BattleConfig;
use crate::env::{ItemKind, Spell, SpellTarget};
use crate::state::{Ailments, CombatantId, EquipmentSlot, Slot};

impl PlanningContext<'_> {
    /// Decides a monster's action for the round.
    ///
    /// A spell choice whose target pool turns out empty disables casting and
    /// re-plans; every other outcome is final.
    pub fn plan_monster(
        &mut self,
        actor: CombatantId,
        situation: FleeSituation,
        reserved: &mut Vec<Slot>,
    ) -> PlannedAction {
        let fleeing = wants_to_flee(&self.combatants[actor.index()], situation, &mut *self.rng);
        let mut can_cast = true;

        loop {
            let kind = self.pick_monster_action(actor, fleeing, reserved, can_cast);
            let planned = match kind {
                BattleActionKind::CastSpell => match self.spell_parameter(actor) {
                    Some(param) => PlannedAction::CastSpell(param),
                    None => {
                        can_cast = false;
                        continue;
                    }
                },
                BattleActionKind::Move => match self.best_move_spot(actor, fleeing, reserved) {
                    Some(target) => {
                        reserved.push(target);
                        PlannedAction::Move(MoveParam { target })
                    }
                    None => {
                        warn!(%actor, "no move spot despite an available move");
                        PlannedAction::None
                    }
                },
                BattleActionKind::Attack => match self.best_attack_spot(actor) {
                    Some(target) => PlannedAction::Attack(self.monster_attack(actor, target)),
                    None => {
                        warn!(%actor, "no attack spot despite an available attack");
                        PlannedAction::None
                    }
                },
                BattleActionKind::Flee => PlannedAction::Flee,
                _ => PlannedAction::None,
            };
            debug!(%actor, fleeing, action = %planned.kind(), "monster planned");
            return planned;
        }
    }

    /// Rolls the action type.
    ///
    /// A monster that wants to flee leaves from the back row or retreats.
    /// Crazy monsters pick between attacking anyone and moving. Otherwise a
    /// 0..=15 roll chooses between a spell (0..8), a ranged attack (8..14)
    /// and melee (14..16). A branch that cannot apply is disabled and the
    /// roll repeats; a roll in a disabled band goes to the next enabled one.
    pub(crate) fn pick_monster_action(
        &mut self,
        actor: CombatantId,
        fleeing: bool,
        reserved: &[Slot],
        can_cast: bool,
    ) -> BattleActionKind {
        let Some(origin) = self.field.slot_of(actor) else {
            return BattleActionKind::None;
        };
        let ailments = self.combatant(actor).ailments;

        if origin.row() == 0 && fleeing && ailments.can_flee() {
            return BattleActionKind::Flee;
        }
        if fleeing && ailments.can_move() && self.move_spot_available(actor, true, reserved) {
            return BattleActionKind::Move;
        }
        if ailments.contains(Ailments::CRAZY) {
            return self.mad_monster_action(actor, fleeing, reserved);
        }

        let mut enabled = [can_cast, true, true];
        while enabled.contains(&true) {
            let roll = self.rng.random_int(0, BattleConfig::ACTION_ROLL_MAX);
            let Some(band) = ActionBand::from_roll(roll).next_enabled(&enabled) else {
                break;
            };
            match band {
                ActionBand::Spell => {
                    if !self.combatant(actor).spells.is_empty()
                        && ailments.can_cast_spell()
                        && !self.available_monster_spells(actor).is_empty()
                    {
                        return BattleActionKind::CastSpell;
                    }
                }
                ActionBand::Ranged => match ranged_attack(self.combatant(actor), self.items) {
                    None => {}
                    Some(loaded) => {
                        if !loaded {
                            self.discard_unloaded_weapon(actor);
                        }
                        return self.attack_or_move(actor, fleeing, reserved);
                    }
                },
                ActionBand::Melee => {
                    if !self.wields_ranged(actor) {
                        return self.attack_or_move(actor, fleeing, reserved);
                    }
                }
            }
            enabled[band as usize] = false;
        }
        BattleActionKind::None
    }

    fn attack_or_move(
        &self,
        actor: CombatantId,
        fleeing: bool,
        reserved: &[Slot],
    ) -> BattleActionKind {
        let ailments = self.combatant(actor).ailments;
        if ailments.can_attack() && self.attack_spot_available(actor, false) {
            BattleActionKind::Attack
        } else if ailments.can_move() && self.move_spot_available(actor, fleeing, reserved) {
            BattleActionKind::Move
        } else {
            BattleActionKind::None
        }
    }

    fn mad_monster_action(
        &mut self,
        actor: CombatantId,
        fleeing: bool,
        reserved: &[Slot],
    ) -> BattleActionKind {
        let attack_first =
            self.rng.random_int(0, BattleConfig::MAD_ROLL_MAX) < BattleConfig::MAD_ATTACK_FIRST_THRESHOLD;
        let ailments = self.combatant(actor).ailments;
        let can_attack = ailments.can_attack()
            && !self.wields_ranged(actor)
            && self.attack_spot_available(actor, true);
        let can_move = ailments.can_move() && self.move_spot_available(actor, fleeing, reserved);

        match (attack_first, can_attack, can_move) {
            (true, true, _) | (false, true, false) => BattleActionKind::Attack,
            (_, _, true) => BattleActionKind::Move,
            _ => BattleActionKind::None,
        }
    }

    /// A ranged weapon without ammunition is swapped for the first melee
    /// weapon in the inventory, or stowed. A monster left unarmed with no
    /// base attack loses half its morale.
    fn discard_unloaded_weapon(&mut self, actor: CombatantId) {
        let items = self.items;
        let monster = &mut self.combatants[actor.index()];
        let weapon = monster.equipment.take(EquipmentSlot::RightHand);
        let melee = monster.inventory.position(|id| {
            items
                .definition(id)
                .is_some_and(|def| def.kind == ItemKind::CloseRangeWeapon)
        });

        match melee.and_then(|index| monster.inventory.get_mut(index)) {
            Some(stored) => {
                let drawn = std::mem::replace(stored, weapon);
                *monster.equipment.get_mut(EquipmentSlot::RightHand) = drawn;
                debug!(%actor, weapon = ?drawn.item, "monster switched to melee weapon");
            }
            None => {
                if !monster.inventory.store(weapon) {
                    debug!(%actor, "no room to stow ranged weapon");
                }
                if monster.combat.base_attack == 0 {
                    monster.halve_morale();
                }
                debug!(%actor, "monster put away its ranged weapon");
            }
        }
    }

    /// Learned spells a monster can cast at the party right now.
    pub fn available_monster_spells(&self, actor: CombatantId) -> Vec<Spell> {
        let caster = self.combatant(actor);
        let spell_points = caster.spell_points.current;
        if spell_points == 0 {
            return Vec::new();
        }
        caster
            .spells
            .iter()
            .copied()
            .filter(|spell| {
                let info = self.spells.info(*spell);
                spell_points >= info.sp_cost
                    && info.castable_by_monster
                    && info.target.targets_enemy()
            })
            .collect()
    }

    fn monster_attack(&self, actor: CombatantId, target: Slot) -> AttackParam {
        let equipment = &self.combatant(actor).equipment;
        let weapon = equipment.item(EquipmentSlot::RightHand);
        let off_hand = equipment.item(EquipmentSlot::LeftHand);
        AttackParam {
            target,
            weapon,
            // A two-handed weapon occupies both hands with the same item.
            ammunition: if off_hand == weapon { None } else { off_hand },
        }
    }

    /// Target and spell for a monster cast.
    ///
    /// Threat is each party member's average damage as a percentage of the
    /// highest. The mean threat of the top damage dealers selects the pool:
    /// 75 and up with an all-enemies spell at hand targets everyone, 50 and
    /// up with a row spell targets the most threatening row, anything else
    /// a single top damage dealer. `None` when the chosen pool is empty.
    pub(crate) fn spell_parameter(&mut self, actor: CombatantId) -> Option<CastSpellParam> {
        let threats: Vec<(Slot, u32)> = self
            .party
            .iter()
            .filter(|id| self.combatant(**id).is_alive() && !self.has_fled(**id))
            .filter_map(|id| Some((self.field.slot_of(*id)?, self.tracker.average(*id))))
            .collect();
        let max_damage = threats.iter().map(|(_, damage)| *damage).max()?;
        let priority = |damage: u32| {
            if max_damage == 0 {
                100
            } else {
                damage * 100 / max_damage
            }
        };
        let top: Vec<(Slot, u32)> = threats
            .iter()
            .filter(|(_, damage)| *damage == max_damage)
            .map(|(slot, damage)| (*slot, priority(*damage)))
            .collect();
        let average_priority = top.iter().map(|(_, p)| *p).sum::<u32>() / top.len() as u32;

        let spells = self.available_monster_spells(actor);
        let has_shape = |shape: SpellTarget| {
            spells
                .iter()
                .any(|spell| self.spells.info(*spell).target == shape)
        };

        let (shape, target) = if average_priority >= BattleConfig::SPELL_PRIO_ALL_TARGETS
            && has_shape(SpellTarget::AllEnemies)
        {
            (SpellTarget::AllEnemies, 0)
        } else if average_priority >= BattleConfig::SPELL_PRIO_ROW_TARGETS
            && has_shape(SpellTarget::EnemyRow)
        {
            (SpellTarget::EnemyRow, most_threatening_row(&top))
        } else {
            let slots: Vec<Slot> = top.iter().map(|(slot, _)| *slot).collect();
            let slot = self.pick(&slots)?;
            (SpellTarget::SingleEnemy, slot.index() as u8)
        };

        let pool: Vec<Spell> = spells
            .into_iter()
            .filter(|spell| self.spells.info(*spell).target == shape)
            .collect();
        let spell = self.pick(&pool)?;
        Some(CastSpellParam::new(spell, target))
    }
}

/// Branch of the monster action roll, in roll order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActionBand {
    Spell = 0,
    Ranged = 1,
    Melee = 2,
}

impl ActionBand {
    const ORDER: [ActionBand; 3] = [ActionBand::Spell, ActionBand::Ranged, ActionBand::Melee];

    fn from_roll(roll: i32) -> Self {
        if roll < BattleConfig::ACTION_ROLL_SPELL {
            Self::Spell
        } else if roll < BattleConfig::ACTION_ROLL_RANGED {
            Self::Ranged
        } else {
            Self::Melee
        }
    }

    /// This band, or the first enabled one after it (wrapping).
    fn next_enabled(self, enabled: &[bool; 3]) -> Option<Self> {
        (0..Self::ORDER.len())
            .map(|offset| Self::ORDER[(self as usize + offset) % Self::ORDER.len()])
            .find(|band| enabled[*band as usize])
    }
}

/// First row (in party order) with the highest mean threat.
fn most_threatening_row(top: &[(Slot, u32)]) -> u8 {
    let mut rows: Vec<(usize, u32, u32)> = Vec::new();
    for (slot, priority) in top {
        match rows.iter_mut().find(|(row, _, _)| *row == slot.row()) {
            Some((_, sum, count)) => {
                *sum += priority;
                *count += 1;
            }
            None => rows.push((slot.row(), *priority, 1)),
        }
    }
    let best = rows
        .iter()
        .map(|(_, sum, count)| sum / count)
        .max()
        .unwrap_or(0);
    rows.iter()
        .find(|(_, sum, count)| sum / count == best)
        .map_or(0, |(row, _, _)| *row as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fixtures::{ARROWS, AXE, BOW, Scene, catalog, hero, orc};
    use crate::env::{ScriptFallback, ScriptedRng, StandardSpells};
    use crate::state::{ItemSlot, MonsterFlags};

    fn calm() -> FleeSituation {
        FleeSituation {
            rde: 50,
            monsters_on_field: 1,
            initial_monsters: 1,
        }
    }

    fn slot(index: usize) -> Slot {
        Slot::new(index).unwrap()
    }

    macro_rules! context {
        ($scene:ident, $items:ident, $rng:ident) => {
            PlanningContext {
                field: &$scene.field,
                combatants: &mut $scene.combatants,
                tracker: &$scene.tracker,
                party: &$scene.party,
                fled: &[],
                items: &$items,
                spells: &StandardSpells,
                rng: &mut $rng,
            }
        };
    }

    #[test]
    fn adjacent_monster_attacks_with_melee_roll() {
        let mut scene = Scene::new(vec![(hero(50), 20), (orc(10), 14)]);
        let items = catalog();
        // Roll 15 selects melee.
        let mut rng = ScriptedRng::new([15], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_monster(CombatantId(1), calm(), &mut Vec::new());
        assert_eq!(
            planned,
            PlannedAction::Attack(AttackParam {
                target: slot(20),
                weapon: None,
                ammunition: None,
            })
        );
    }

    #[test]
    fn spell_roll_without_spells_falls_back_to_fighting() {
        let mut scene = Scene::new(vec![(hero(50), 20), (orc(10), 14)]);
        let items = catalog();
        // 0 tries a spell (none known), 9 tries ranged (no bow), 15 melee.
        let mut rng = ScriptedRng::new([0, 9, 15], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let kind = ctx.pick_monster_action(CombatantId(1), false, &[], true);
        assert_eq!(kind, BattleActionKind::Attack);
    }

    #[test]
    fn constant_low_rolls_still_reach_melee() {
        let mut scene = Scene::new(vec![(hero(50), 20), (orc(10), 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        let kind = ctx.pick_monster_action(CombatantId(1), false, &[], true);
        assert_eq!(kind, BattleActionKind::Attack);
    }

    #[test]
    fn disabled_band_passes_the_roll_on() {
        let enabled = [false, false, true];
        assert_eq!(
            ActionBand::from_roll(0).next_enabled(&enabled),
            Some(ActionBand::Melee)
        );
        assert_eq!(
            ActionBand::from_roll(15).next_enabled(&[true, false, false]),
            Some(ActionBand::Spell)
        );
        assert_eq!(ActionBand::from_roll(9).next_enabled(&[false; 3]), None);
    }

    #[test]
    fn distant_monster_moves_and_reserves_its_destination() {
        let mut scene = Scene::new(vec![(hero(50), 26), (orc(10), 2)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([15], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let mut reserved = Vec::new();
        let planned = ctx.plan_monster(CombatantId(1), calm(), &mut reserved);
        assert_eq!(planned, PlannedAction::Move(MoveParam { target: slot(8) }));
        assert_eq!(reserved, vec![slot(8)]);
    }

    #[test]
    fn monster_in_back_row_that_wants_to_flee_leaves() {
        let mut panicked = orc(10).with_ailments(Ailments::PANIC);
        panicked.hit_points.current = 1;
        let mut scene = Scene::new(vec![(hero(50), 26), (panicked, 3)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_monster(CombatantId(1), calm(), &mut Vec::new());
        assert_eq!(planned, PlannedAction::Flee);
    }

    #[test]
    fn bosses_keep_fighting_at_low_health() {
        let mut boss = orc(10);
        if let Some(traits) = boss.monster_traits_mut() {
            traits.flags |= MonsterFlags::BOSS;
            traits.morale = 0;
        }
        boss.hit_points.current = 1;
        let mut scene = Scene::new(vec![(hero(50), 20), (boss, 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([15], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_monster(CombatantId(1), calm(), &mut Vec::new());
        assert_eq!(planned.kind(), BattleActionKind::Attack);
    }

    #[test]
    fn archer_without_arrows_draws_its_axe() {
        let mut archer = orc(10);
        archer.equipment = archer
            .equipment
            .with(EquipmentSlot::RightHand, ItemSlot::holding(BOW, 1))
            .with(EquipmentSlot::LeftHand, ItemSlot::holding(BOW, 1));
        archer.inventory.push(ItemSlot::holding(AXE, 1));
        let mut scene = Scene::new(vec![(hero(50), 20), (archer, 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([9], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let kind = ctx.pick_monster_action(CombatantId(1), false, &[], true);
        assert_eq!(kind, BattleActionKind::Attack);
        assert_eq!(scene.combatants[1].equipment.weapon(), Some(AXE));
        assert_eq!(scene.combatants[1].inventory.get(0).and_then(|s| s.item), Some(BOW));
    }

    #[test]
    fn loaded_archer_attacks_from_the_back() {
        let mut archer = orc(10);
        archer.equipment = archer
            .equipment
            .with(EquipmentSlot::RightHand, ItemSlot::holding(BOW, 1))
            .with(EquipmentSlot::LeftHand, ItemSlot::holding(ARROWS, 12));
        let mut scene = Scene::new(vec![(hero(50), 26), (archer, 2)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([9], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_monster(CombatantId(1), calm(), &mut Vec::new());
        assert_eq!(
            planned,
            PlannedAction::Attack(AttackParam {
                target: slot(26),
                weapon: Some(BOW),
                ammunition: Some(ARROWS),
            })
        );
    }

    #[test]
    fn all_enemy_spells_are_preferred_by_casters() {
        let caster = orc(10).with_spells(200, vec![Spell::Fireball, Spell::Iceshower]);
        let mut scene = Scene::new(vec![(hero(50), 20), (hero(50), 27), (caster, 2)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([0], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_monster(CombatantId(2), calm(), &mut Vec::new());
        assert_eq!(
            planned,
            PlannedAction::CastSpell(CastSpellParam::new(Spell::Iceshower, 0))
        );
    }
}
