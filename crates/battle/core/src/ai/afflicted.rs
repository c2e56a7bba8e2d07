//! Replacement actions for party members who lost control of themselves.

use tracing::{debug, warn};

use crate::action::{AttackParam, MoveParam, PlannedAction};
use crate::ai::PlanningContext;
use crate::config::BattleConfig;
use crate::state::{CombatantId, Slot};

impl PlanningContext<'_> {
    /// Action of a panicked party member, overriding whatever was chosen.
    ///
    /// From the back row it flees. From the front row it retreats one row,
    /// preferring the square straight behind and otherwise picking one of
    /// the diagonal squares at random. It passes when neither works.
    pub fn plan_panic(&mut self, actor: CombatantId, reserved: &[Slot]) -> PlannedAction {
        let Some(origin) = self.field.slot_of(actor) else {
            return PlannedAction::None;
        };
        let ailments = self.combatant(actor).ailments;

        if origin.index() >= BattleConfig::PANIC_FLEE_SLOT {
            return if ailments.can_flee() {
                PlannedAction::Flee
            } else {
                PlannedAction::None
            };
        }
        if !ailments.can_move() || !self.move_spot_available(actor, true, reserved) {
            return PlannedAction::None;
        }

        let column = origin.column();
        let row = origin.row() + 1;
        let open = |slot: &Slot| self.field.is_free(*slot) && !reserved.contains(slot);

        if let Some(behind) = Slot::at(column, row).filter(open) {
            return PlannedAction::Move(MoveParam { target: behind });
        }
        let diagonals: Vec<Slot> = [column.checked_sub(1), Some(column + 1)]
            .into_iter()
            .flatten()
            .filter_map(|c| Slot::at(c, row))
            .filter(open)
            .collect();
        match self.pick(&diagonals) {
            Some(target) => PlannedAction::Move(MoveParam { target }),
            None => {
                warn!(%actor, "panicked party member found no square to retreat to");
                PlannedAction::None
            }
        }
    }

    /// Action of a crazy party member: attack anyone adjacent or wander one
    /// square, with attacking tried first 40000 times in 65536.
    pub fn plan_mad(&mut self, actor: CombatantId, reserved: &mut Vec<Slot>) -> PlannedAction {
        let attack_first = self.rng.random_int(0, BattleConfig::MAD_ROLL_MAX)
            < BattleConfig::MAD_ATTACK_FIRST_THRESHOLD;

        let planned = if attack_first {
            match self.try_mad_attack(actor) {
                Some(planned) => Some(planned),
                None => self.try_mad_move(actor, reserved),
            }
        } else {
            match self.try_mad_move(actor, reserved) {
                Some(planned) => Some(planned),
                None => self.try_mad_attack(actor),
            }
        };
        let planned = planned.unwrap_or_default();
        debug!(%actor, attack_first, action = %planned.kind(), "mad party member planned");
        planned
    }

    fn try_mad_attack(&mut self, actor: CombatantId) -> Option<PlannedAction> {
        let ailments = self.combatant(actor).ailments;
        if !ailments.can_attack()
            || self.wields_ranged(actor)
            || !self.attack_spot_available(actor, true)
        {
            return None;
        }
        let target = self.random_attack_spot(actor)?;
        Some(PlannedAction::Attack(AttackParam::with_equipped(
            target,
            self.combatant(actor),
            self.items,
        )))
    }

    fn try_mad_move(&mut self, actor: CombatantId, reserved: &mut Vec<Slot>) -> Option<PlannedAction> {
        let ailments = self.combatant(actor).ailments;
        if !ailments.can_move() || !self.move_spot_available(actor, false, reserved) {
            return None;
        }
        let target = self.random_move_spot(actor, reserved)?;
        reserved.push(target);
        Some(PlannedAction::Move(MoveParam { target }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fixtures::{Scene, catalog, hero, orc};
    use crate::env::{ScriptFallback, ScriptedRng, StandardSpells};
    use crate::state::Ailments;

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
    fn panicked_member_in_back_row_flees() {
        let scared = hero(50).with_ailments(Ailments::PANIC);
        let mut scene = Scene::new(vec![(scared, 26), (orc(10), 8)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert_eq!(ctx.plan_panic(CombatantId(0), &[]), PlannedAction::Flee);
    }

    #[test]
    fn lamed_panicked_member_in_back_row_passes() {
        let stuck = hero(50).with_ailments(Ailments::PANIC | Ailments::LAMED);
        let mut scene = Scene::new(vec![(stuck, 26), (orc(10), 8)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert_eq!(ctx.plan_panic(CombatantId(0), &[]), PlannedAction::None);
    }

    #[test]
    fn panicked_member_in_front_row_retreats_straight_back() {
        let scared = hero(50).with_ailments(Ailments::PANIC);
        let mut scene = Scene::new(vec![(scared, 20), (orc(10), 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert_eq!(
            ctx.plan_panic(CombatantId(0), &[]),
            PlannedAction::Move(MoveParam { target: slot(26) })
        );
    }

    #[test]
    fn panicked_member_sidesteps_when_blocked_behind() {
        let scared = hero(50).with_ailments(Ailments::PANIC);
        let mut scene = Scene::new(vec![(scared, 20), (hero(50), 26), (orc(10), 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([1], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        assert_eq!(
            ctx.plan_panic(CombatantId(0), &[]),
            PlannedAction::Move(MoveParam { target: slot(27) })
        );
    }

    #[test]
    fn mad_member_attacks_its_neighbour_when_rolling_low() {
        let mad = hero(50).with_ailments(Ailments::CRAZY);
        let mut scene = Scene::new(vec![(mad, 20), (hero(50), 21)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([0], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let planned = ctx.plan_mad(CombatantId(0), &mut Vec::new());
        assert_eq!(
            planned,
            PlannedAction::Attack(AttackParam {
                target: slot(21),
                weapon: None,
                ammunition: None,
            })
        );
    }

    #[test]
    fn mad_member_wanders_when_rolling_high() {
        let mad = hero(50).with_ailments(Ailments::CRAZY);
        let mut scene = Scene::new(vec![(mad, 20), (hero(50), 21)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([60000, 0], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let mut reserved = Vec::new();
        let planned = ctx.plan_mad(CombatantId(0), &mut reserved);
        assert_eq!(planned, PlannedAction::Move(MoveParam { target: slot(19) }));
        assert_eq!(reserved, vec![slot(19)]);
    }
}
