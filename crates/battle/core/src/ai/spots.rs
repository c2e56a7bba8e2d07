//! Where a combatant can move or strike, and where it prefers to.

use crate::ai::PlanningContext;
use crate::ai::range::{
    Bounds, RangeKind, attack_range, has_long_ranged_weapon, move_range, range_bounds,
};
use crate::config::BattleConfig;
use crate::state::{Ailments, CombatantId, Side, Slot};

const LAST_COLUMN: usize = BattleConfig::COLUMNS - 1;

fn is_edge_column(slot: Slot) -> bool {
    slot.column() == 0 || slot.column() == LAST_COLUMN
}

impl PlanningContext<'_> {
    pub(crate) fn nearby_party_count(&self, slot: Slot) -> usize {
        Bounds::around(slot)
            .slots()
            .filter(|cell| self.side_at(*cell) == Some(Side::Party))
            .count()
    }

    pub(crate) fn is_party_nearby(&self, slot: Slot) -> bool {
        self.nearby_party_count(slot) > 0
    }

    fn is_open(&self, slot: Slot, reserved: &[Slot]) -> bool {
        self.field.is_free(slot) && !reserved.contains(&slot)
    }

    /// Whether the combatant has at least one legal move.
    ///
    /// Monsters that are not fleeing only step sideways onto squares next to
    /// a party member; fleeing monsters only move backwards. A fleeing party
    /// member must move to a row behind its own.
    pub fn move_spot_available(&self, actor: CombatantId, fleeing: bool, reserved: &[Slot]) -> bool {
        let Some(origin) = self.field.slot_of(actor) else {
            return false;
        };
        let mover = self.combatant(actor);
        let side = mover.side();
        let Some(bounds) = range_bounds(origin, side, move_range(mover), RangeKind::Move, fleeing)
        else {
            return false;
        };
        let current_row = origin.row();

        bounds
            .slots()
            .filter(|slot| match side {
                Side::Monsters if fleeing => slot.row() < current_row,
                Side::Monsters => slot.row() >= current_row,
                Side::Party => !(fleeing && slot.row() <= current_row),
            })
            .filter(|slot| self.is_open(*slot, reserved))
            .any(|slot| {
                slot.row() != current_row || side == Side::Party || self.is_party_nearby(slot)
            })
    }

    /// Whether anything attackable is in reach. Mad attackers accept any
    /// combatant but themselves.
    pub fn attack_spot_available(&self, actor: CombatantId, mad: bool) -> bool {
        let Some(origin) = self.field.slot_of(actor) else {
            return false;
        };
        let attacker = self.combatant(actor);
        let range = attack_range(attacker, self.items);
        let Some(bounds) = range_bounds(origin, attacker.side(), range, RangeKind::Enemy, false)
        else {
            return false;
        };
        bounds
            .slots()
            .filter_map(|slot| self.field.occupant(slot))
            .any(|id| {
                if mad {
                    id != actor
                } else {
                    self.combatant(id).side() != attacker.side()
                }
            })
    }

    /// Any free, unreserved square one step away.
    pub(crate) fn random_move_spot(&mut self, actor: CombatantId, reserved: &[Slot]) -> Option<Slot> {
        let origin = self.field.slot_of(actor)?;
        let side = self.combatant(actor).side();
        let bounds = range_bounds(origin, side, 1, RangeKind::Move, false)?;
        let candidates: Vec<Slot> = bounds
            .slots()
            .filter(|slot| self.is_open(*slot, reserved))
            .collect();
        self.pick(&candidates)
    }

    /// Any occupied square one step away, the attacker's own excluded.
    pub(crate) fn random_attack_spot(&mut self, actor: CombatantId) -> Option<Slot> {
        let origin = self.field.slot_of(actor)?;
        let side = self.combatant(actor).side();
        let bounds = range_bounds(origin, side, 1, RangeKind::Enemy, false)?;
        let candidates: Vec<Slot> = bounds
            .slots()
            .filter(|slot| {
                self.field
                    .occupant(*slot)
                    .is_some_and(|id| id != actor)
            })
            .collect();
        self.pick(&candidates)
    }

    /// Preferred destination of a monster's move.
    ///
    /// Fleeing monsters go straight back when they can. Others prefer
    /// squares next to the most party members (center columns first), then
    /// straight ahead unless on an edge column, then any non-edge square.
    pub(crate) fn best_move_spot(
        &mut self,
        actor: CombatantId,
        fleeing: bool,
        reserved: &[Slot],
    ) -> Option<Slot> {
        let origin = self.field.slot_of(actor)?;
        let mover = self.combatant(actor);
        let range = if mover.speed() >= BattleConfig::FAST_MOVER_SPEED {
            2
        } else {
            1
        };
        let bounds = range_bounds(origin, mover.side(), range, RangeKind::Move, fleeing)?;
        let column = origin.column();
        let current_row = origin.row();

        if fleeing {
            let straight_back = (bounds.min_row..current_row)
                .filter_map(|row| Slot::at(column, row))
                .find(|slot| self.is_open(*slot, reserved));
            if straight_back.is_some() {
                return straight_back;
            }
        }

        let possible: Vec<Slot> = bounds
            .slots()
            .filter(|slot| self.is_open(*slot, reserved))
            .filter(|slot| slot.row() != current_row || self.is_party_nearby(*slot))
            .collect();

        if !fleeing {
            let mut near: Vec<Slot> = possible
                .iter()
                .copied()
                .filter(|slot| self.is_party_nearby(*slot))
                .collect();

            if !near.is_empty() {
                if near.len() > 1 {
                    let counts: Vec<usize> =
                        near.iter().map(|slot| self.nearby_party_count(*slot)).collect();
                    let most = counts.iter().copied().max().unwrap_or(0);
                    let least = counts.iter().copied().min().unwrap_or(0);
                    if most > least {
                        near = near
                            .into_iter()
                            .zip(counts)
                            .filter_map(|(slot, count)| (count == most).then_some(slot))
                            .collect();
                    }

                    let center = |slot: &Slot| matches!(slot.column(), 2 | 3);
                    let inner = |slot: &Slot| matches!(slot.column(), 1 | 4);
                    if near.iter().any(center) {
                        near.retain(center);
                    } else if near.iter().any(inner) {
                        near.retain(inner);
                    }
                }
                return self.pick(&near);
            }

            if column != 0 && column != LAST_COLUMN {
                let ahead = (current_row + 1..=bounds.max_row)
                    .rev()
                    .filter_map(|row| Slot::at(column, row))
                    .find(|slot| self.is_open(*slot, reserved));
                if ahead.is_some() {
                    return ahead;
                }
            }

            let inner: Vec<Slot> = possible
                .iter()
                .copied()
                .filter(|slot| !is_edge_column(*slot))
                .collect();
            if !inner.is_empty() {
                return self.pick(&inner);
            }
        } else {
            // The second straight-back scan is bounded by the column limit,
            // not the row limit, and can therefore reach rows ahead.
            let last_row = bounds.max_column.min(BattleConfig::MONSTER_MAX_ROW);
            let fallback = (bounds.min_row..=last_row)
                .filter_map(|row| Slot::at(column, row))
                .find(|slot| self.is_open(*slot, reserved));
            if fallback.is_some() {
                return fallback;
            }
        }

        self.pick(&possible)
    }

    /// Preferred target of a monster's attack: the party member with the
    /// highest average damage so far, ties broken at random. Crazy monsters
    /// pick any combatant in reach.
    pub(crate) fn best_attack_spot(&mut self, actor: CombatantId) -> Option<Slot> {
        let origin = self.field.slot_of(actor)?;
        let attacker = self.combatant(actor);
        let mad = attacker.ailments.contains(Ailments::CRAZY);
        let range = attack_range(attacker, self.items);
        let bounds = range_bounds(origin, attacker.side(), range, RangeKind::Enemy, false)?;

        let candidates: Vec<(Slot, u32)> = bounds
            .slots()
            .filter_map(|slot| {
                let id = self.field.occupant(slot)?;
                let eligible = if mad {
                    id != actor
                } else {
                    self.combatant(id).is_party_member()
                };
                eligible.then(|| (slot, if mad { 0 } else { self.tracker.average(id) }))
            })
            .collect();

        if let [(only, _)] = candidates.as_slice() {
            return Some(*only);
        }

        let pool: Vec<Slot> = if mad {
            candidates.iter().map(|(slot, _)| *slot).collect()
        } else {
            let best = candidates.iter().map(|(_, damage)| *damage).max()?;
            candidates
                .iter()
                .filter_map(|(slot, damage)| (*damage == best).then_some(*slot))
                .collect()
        };
        if let [only] = pool.as_slice() {
            return Some(*only);
        }
        self.pick(&pool)
    }

    /// Whether a long-ranged weapon keeps the combatant from melee.
    pub(crate) fn wields_ranged(&self, actor: CombatantId) -> bool {
        has_long_ranged_weapon(self.combatant(actor), self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fixtures::{Scene, catalog, hero, orc};
    use crate::env::{ScriptFallback, ScriptedRng};

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
                spells: &crate::env::StandardSpells,
                rng: &mut $rng,
            }
        };
    }

    #[test]
    fn monster_in_front_of_party_has_an_attack_spot() {
        let mut scene = Scene::new(vec![(hero(50), 20), (orc(10), 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let ctx = context!(scene, items, rng);
        assert!(ctx.attack_spot_available(CombatantId(1), false));
    }

    #[test]
    fn monster_far_from_party_walks_straight_ahead() {
        let mut scene = Scene::new(vec![(hero(50), 26), (orc(10), 2)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert!(!ctx.attack_spot_available(CombatantId(1), false));
        assert!(ctx.move_spot_available(CombatantId(1), false, &[]));
        assert_eq!(ctx.best_move_spot(CombatantId(1), false, &[]), Some(slot(8)));
    }

    #[test]
    fn moves_next_to_the_party_are_preferred() {
        // Orc at column 3, row 1; hero at column 4, row 3. Row 2 squares in
        // columns 3..=5 touch the hero; center column 3 wins.
        let mut scene = Scene::new(vec![(hero(50), 22), (orc(10), 9)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert_eq!(ctx.best_move_spot(CombatantId(1), false, &[]), Some(slot(15)));
    }

    #[test]
    fn reserved_squares_are_not_chosen() {
        let mut scene = Scene::new(vec![(hero(50), 26), (orc(10), 2)]);
        let items = catalog();
        let mut rng = ScriptedRng::new([0], ScriptFallback::Min);
        let mut ctx = context!(scene, items, rng);
        let spot = ctx.best_move_spot(CombatantId(1), false, &[slot(8)]);
        assert_ne!(spot, Some(slot(8)));
        assert!(spot.is_some());
    }

    #[test]
    fn fleeing_monster_retreats_straight_back() {
        let mut scene = Scene::new(vec![(hero(50), 20), (orc(10), 14)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert!(ctx.move_spot_available(CombatantId(1), true, &[]));
        assert_eq!(ctx.best_move_spot(CombatantId(1), true, &[]), Some(slot(8)));
    }

    #[test]
    fn best_attack_spot_prefers_the_hardest_hitter() {
        let mut scene = Scene::new(vec![(hero(50), 19), (hero(50), 20), (orc(10), 14)]);
        scene.tracker.record(CombatantId(1), 12);
        scene.tracker.record(CombatantId(0), 4);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert_eq!(ctx.best_attack_spot(CombatantId(2)), Some(slot(20)));
    }

    #[test]
    fn mad_party_member_may_strike_anyone_but_itself() {
        let mut scene = Scene::new(vec![(hero(50), 20), (hero(50), 21)]);
        let items = catalog();
        let mut rng = ScriptedRng::always_min();
        let mut ctx = context!(scene, items, rng);
        assert!(ctx.attack_spot_available(CombatantId(0), true));
        assert!(!ctx.attack_spot_available(CombatantId(0), false));
        assert_eq!(ctx.random_attack_spot(CombatantId(0)), Some(slot(21)));
    }
}
