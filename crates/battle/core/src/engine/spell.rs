//! Spell casting and ailments.
//!
//! A cast resolves its targets up front, then visits them one at a time:
//! each target passes the deflection and immunity checks, plays its hit
//! animation and receives the effect before the next one is touched.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{
    AnimationKind, Battle, BattleError, BattleEvent, BattleMessage, PresentationSink, Resume,
    SpellCast,
};
use crate::action::{BattleActionKind, CastSpellParam, ItemSource};
use crate::combat::spell_damage;
use crate::config::BattleConfig;
use crate::env::{Spell, SpellEffect, SpellTarget};
use crate::state::{Ailments, CombatantId, Side, Slot};

/// Result of the per-target checks.
enum SpellCheck {
    Passed,
    Deflected,
    /// Fizzled, optionally with a message for the log.
    Failed(Option<BattleMessage>),
}

impl Battle {
    pub(super) fn cast_spell(
        &mut self,
        caster: CombatantId,
        param: CastSpellParam,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        sink.clear_message();
        let info = self.env.spell(param.spell);
        self.cast = Some(SpellCast {
            caster,
            param,
            info,
            targets: VecDeque::new(),
        });
        let color = self.color_of(caster);
        debug!(%caster, spell = %param.spell, "casting");

        if param.item.is_none() {
            self.get_mut(caster).spell_points.drain(info.sp_cost);
            let use_magic = self.get(caster).abilities.use_magic;
            if self.env.rng().roll_percent() >= use_magic {
                sink.show_message(
                    BattleMessage::SpellFailed {
                        actor: self.name(caster),
                    },
                    color,
                );
                return self.resume(Resume::SpellEnd { needs_click: true }, sink);
            }
        }

        let single_target = param.target_slot().and_then(|slot| self.field.occupant(slot));
        match info.target {
            SpellTarget::SingleEnemy if single_target.is_none() => {
                sink.show_message(
                    BattleMessage::MissedTarget {
                        actor: self.name(caster),
                    },
                    color,
                );
                return self.proceed(Resume::SpellEnd { needs_click: false }, sink);
            }
            SpellTarget::SingleFriend if single_target.is_none() => {
                return self.resume(Resume::SpellEnd { needs_click: false }, sink);
            }
            _ => {}
        }

        if self.get(caster).is_monster() {
            self.animate(AnimationKind::Cast { caster }, Resume::SpellStart, sink)
        } else {
            self.resume(Resume::SpellStart, sink)
        }
    }

    fn active_cast(&self) -> Result<&SpellCast, BattleError> {
        self.cast.as_ref().ok_or(BattleError::InvalidQueuedAction {
            kind: BattleActionKind::CastSpell,
        })
    }

    /// Combatants of `side` in one row, right to left.
    fn row_targets(&self, side: Side, row: usize) -> Vec<CombatantId> {
        (0..BattleConfig::COLUMNS)
            .rev()
            .filter_map(|column| Slot::at(column, row))
            .filter_map(|slot| self.field.occupant(slot))
            .filter(|&id| self.get(id).side() == side)
            .collect()
    }

    /// Every combatant of `side`, back rows first.
    fn side_targets(&self, side: Side) -> Vec<CombatantId> {
        let rows = match side {
            Side::Monsters => 0..=BattleConfig::MONSTER_MAX_ROW,
            Side::Party => BattleConfig::PARTY_MIN_ROW..=BattleConfig::ROWS - 1,
        };
        rows.rev()
            .flat_map(|row| self.row_targets(side, row))
            .collect()
    }

    pub(super) fn start_casting(&mut self, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let cast = self.active_cast()?;
        let caster = cast.caster;
        let param = cast.param;
        let caster_side = self.get(caster).side();

        let targets: Vec<CombatantId> = match cast.info.target {
            SpellTarget::None => return self.apply_spell_effect(None, sink),
            SpellTarget::SingleEnemy | SpellTarget::SingleFriend => param
                .target_slot()
                .and_then(|slot| self.field.occupant(slot))
                .into_iter()
                .collect(),
            SpellTarget::AllEnemies => self.side_targets(caster_side.opponent()),
            SpellTarget::AllFriends => self.side_targets(caster_side),
            shape @ (SpellTarget::EnemyRow | SpellTarget::FriendRow) => {
                let side = if shape == SpellTarget::EnemyRow {
                    caster_side.opponent()
                } else {
                    caster_side
                };
                let targets = self.row_targets(side, usize::from(param.target));
                if targets.is_empty() {
                    sink.show_message(
                        BattleMessage::MissedTarget {
                            actor: self.name(caster),
                        },
                        self.color_of(caster),
                    );
                    return self.proceed(Resume::SpellEnd { needs_click: false }, sink);
                }
                targets
            }
            SpellTarget::BattleField => {
                let Some(character) = param.target_slot().and_then(|slot| self.field.occupant(slot))
                else {
                    sink.show_message(
                        BattleMessage::MissedTarget {
                            actor: self.name(caster),
                        },
                        self.color_of(caster),
                    );
                    return self.proceed(Resume::SpellEnd { needs_click: false }, sink);
                };
                return self.apply_spell_effect(Some(character), sink);
            }
        };

        if let Some(cast) = self.cast.as_mut() {
            cast.targets = targets.into();
        }
        self.cast_next_target(sink)
    }

    pub(super) fn cast_next_target(&mut self, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let next = self.cast.as_mut().and_then(|cast| cast.targets.pop_front());
        match next {
            Some(target) => self.cast_on(target, sink),
            None => self.resume(Resume::SpellEnd { needs_click: false }, sink),
        }
    }

    fn cast_on(&mut self, target: CombatantId, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let Some(slot) = self.field.slot_of(target) else {
            return self.cast_next_target(sink);
        };
        let cast = self.active_cast()?;
        let caster = cast.caster;
        let spell = cast.info.spell;
        let single = matches!(
            cast.info.target,
            SpellTarget::SingleEnemy | SpellTarget::SingleFriend
        );

        if matches!(spell, Spell::Hurry | Spell::MassHurry)
            && self.is_party(target)
            && !self.hurried.contains(&target)
        {
            self.hurried.push(target);
        }

        match self.check_spell(caster, target, single) {
            SpellCheck::Passed => self.animate(
                AnimationKind::SpellHit { spell, slot },
                Resume::SpellApply { target },
                sink,
            ),
            SpellCheck::Deflected => {
                sink.show_message(
                    BattleMessage::DeflectedSpell {
                        target: self.name(target),
                    },
                    self.color_of(caster),
                );
                self.animate(
                    AnimationKind::BlockSpell { slot },
                    Resume::SpellNextTarget,
                    sink,
                )
            }
            SpellCheck::Failed(Some(message)) => {
                sink.show_message(message, self.color_of(caster));
                self.proceed(Resume::SpellNextTarget, sink)
            }
            SpellCheck::Failed(None) => self.cast_next_target(sink),
        }
    }

    /// Deflection, immunity and petrification checks for one target.
    fn check_spell(&mut self, caster: CombatantId, target: CombatantId, single: bool) -> SpellCheck {
        let Some(cast) = self.cast.as_ref() else {
            return SpellCheck::Failed(None);
        };
        let info = cast.info;
        let spell = info.spell;
        let victim = &self.combatants[target.index()];
        let name = victim.name.clone();

        if victim.side() != self.combatants[caster.index()].side() {
            let buff = if victim.is_party_member() {
                self.active_spells.anti_magic
            } else {
                0
            };
            let anti_magic = victim.attributes.anti_magic + buff;
            if self.env.rng().roll_percent() < anti_magic {
                return SpellCheck::Deflected;
            }
            if victim.spell_immunity.contains(spell.school().as_flag()) {
                return SpellCheck::Failed(Some(BattleMessage::ImmuneToSpellType { target: name }));
            }
            if spell.targets_undead_only() && !victim.is_undead() {
                return SpellCheck::Failed(single.then_some(BattleMessage::ImmuneToSpell { target: name }));
            }
        }
        if victim.ailments.contains(Ailments::PETRIFIED) && info.fails_against_petrified() {
            return SpellCheck::Failed(Some(BattleMessage::CannotDamagePetrified));
        }
        SpellCheck::Passed
    }

    /// Applies the spell's effect to one target (or to nobody for
    /// untargeted spells) and moves on to the next target.
    pub(super) fn apply_spell_effect(
        &mut self,
        target: Option<CombatantId>,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let cast = self.active_cast()?;
        let caster = cast.caster;
        let spell = cast.info.spell;
        let blink_destination = cast.param.blink_slot();
        let level = self.get(caster).level;

        let effect = spell.effect();
        let victim = match (target, effect) {
            (_, SpellEffect::Escape | SpellEffect::ShowMonsterLP)
            | (None, SpellEffect::External) => return self.apply_untargeted(caster, spell, sink),
            (None, _) => {
                warn!(%caster, %spell, "spell effect without a target");
                return self.cast_next_target(sink);
            }
            (Some(victim), _) => victim,
        };

        match effect {
            SpellEffect::Damage { base, variable } => {
                let damage = spell_damage(base, variable, self.env.rng());
                self.deal_spell_damage(caster, victim, damage, sink)
            }
            SpellEffect::HalfLevelDamage => {
                let damage = spell_damage(level / 2, 0, self.env.rng());
                self.deal_spell_damage(caster, victim, damage, sink)
            }
            SpellEffect::StealHitPoints => {
                let damage = spell_damage(level, 0, self.env.rng());
                self.get_mut(caster).hit_points.restore(level);
                self.deal_spell_damage(caster, victim, damage, sink)
            }
            SpellEffect::StealSpellPoints => {
                let drained = self.get_mut(victim).spell_points.drain(level);
                self.get_mut(caster).spell_points.restore(level);
                debug!(%caster, %victim, drained, "spell points stolen");
                self.cast_next_target(sink)
            }
            SpellEffect::Afflict(ailment) => {
                self.add_ailment(victim, ailment, sink);
                self.cast_next_target(sink)
            }
            SpellEffect::Dissolve => self.dissolve(caster, victim, sink),
            SpellEffect::Blink => {
                sink.show_message(
                    BattleMessage::HasBlinked {
                        target: self.name(victim),
                    },
                    self.color_of(caster),
                );
                match blink_destination.filter(|&slot| self.field.is_free(slot)) {
                    Some(destination) => {
                        let from = self.field.move_to(victim, destination)?;
                        sink.notify(BattleEvent::CombatantMoved {
                            combatant: victim,
                            from,
                            to: destination,
                        });
                    }
                    None => warn!(%victim, "blink destination is not free"),
                }
                self.proceed(Resume::SpellNextTarget, sink)
            }
            SpellEffect::MonsterKnowledge => {
                if self.get(victim).is_monster() {
                    sink.notify(BattleEvent::MonsterInfoRequested { monster: victim });
                }
                self.cast_next_target(sink)
            }
            SpellEffect::Hurry => self.cast_next_target(sink),
            SpellEffect::External => {
                sink.notify(BattleEvent::SpellEffectRequested {
                    caster,
                    target: Some(victim),
                    spell,
                });
                self.cast_next_target(sink)
            }
            SpellEffect::Escape | SpellEffect::ShowMonsterLP => {
                self.apply_untargeted(caster, spell, sink)
            }
        }
    }

    fn apply_untargeted(
        &mut self,
        caster: CombatantId,
        spell: Spell,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        match spell.effect() {
            SpellEffect::Escape => {
                debug!(%caster, "party escapes by magic");
                self.end_battle(false, sink);
                Ok(())
            }
            SpellEffect::ShowMonsterLP => {
                self.show_monster_lp = true;
                self.cast_next_target(sink)
            }
            _ => {
                sink.notify(BattleEvent::SpellEffectRequested {
                    caster,
                    target: None,
                    spell,
                });
                self.cast_next_target(sink)
            }
        }
    }

    fn deal_spell_damage(
        &mut self,
        caster: CombatantId,
        target: CombatantId,
        damage: u32,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        self.tracker.record(caster, damage);
        let Some(slot) = self.field.slot_of(target) else {
            return self.cast_next_target(sink);
        };
        self.animate(
            AnimationKind::Hurt {
                combatant: target,
                slot,
            },
            Resume::SpellTargetDamaged { target, damage },
            sink,
        )
    }

    pub(super) fn spell_damage_landed(
        &mut self,
        target: CombatantId,
        damage: u32,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        if let Some(slot) = self.field.slot_of(target) {
            sink.notify(BattleEvent::DamageDisplayed {
                combatant: target,
                slot,
                damage,
            });
        }
        self.wake(target, sink);
        self.get_mut(target).take_damage(damage);
        if self.get(target).is_alive() {
            return self.cast_next_target(sink);
        }
        let caster = self.active_cast()?.caster;
        self.handle_death(Some(caster), target, Resume::SpellNextTarget, sink)
    }

    /// Removes the target from the battle outright.
    fn dissolve(
        &mut self,
        caster: CombatantId,
        target: CombatantId,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let Some(slot) = self.remove_from_field(target, sink) else {
            return self.cast_next_target(sink);
        };
        debug!(%caster, %target, "dissolved");
        if self.get(target).is_monster() {
            self.fled.push(target);
            let attacker = Some(caster).filter(|&id| self.is_party(id));
            self.kill_monster(attacker, target, slot, sink);
        } else {
            self.get_mut(target).hit_points.current = 0;
            self.kill_player(target, sink);
        }
        if self.outcome.is_some() {
            return Ok(());
        }
        self.cast_next_target(sink)
    }

    pub(super) fn end_cast(&mut self, needs_click: bool, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        if let Some(cast) = self.cast.take() {
            if let Some(source) = cast.param.item {
                let owner = self.get_mut(cast.caster);
                let slot = match source {
                    ItemSource::Equipment(slot) => Some(owner.equipment.get_mut(slot)),
                    ItemSource::Inventory(index) => owner.inventory.get_mut(usize::from(index)),
                };
                if let Some(slot) = slot {
                    slot.charges = slot.charges.saturating_sub(1);
                }
            }
        }
        self.proceed(Resume::Finish { needs_click }, sink)
    }

    /// Inflicts an ailment and drops queued actions it rules out.
    pub(super) fn add_ailment(&mut self, target: CombatantId, ailment: Ailments, sink: &mut dyn PresentationSink) {
        let combatant = self.get_mut(target);
        combatant.ailments |= ailment;
        let ailments = combatant.ailments;
        sink.notify(BattleEvent::AilmentAdded {
            combatant: target,
            ailment,
        });

        if self.is_party(target) && !ailment.can_parry() {
            self.parrying.retain(|&id| id != target);
        }

        let pending = |kind: BattleActionKind| self.queue.has_pending(target, kind);
        let blocked = !ailments.can_select()
            || (!ailments.can_attack() && pending(BattleActionKind::Attack))
            || (!ailments.can_cast_spell() && pending(BattleActionKind::CastSpell))
            || (!ailments.can_move() && pending(BattleActionKind::Move))
            || (!ailments.can_flee() && pending(BattleActionKind::Flee));
        if blocked {
            debug!(%target, ?ailments, "ailment cancels queued actions");
            self.queue.skip_actor(target);
        }
    }

    /// Damage wakes a sleeping combatant.
    pub(super) fn wake(&mut self, target: CombatantId, sink: &mut dyn PresentationSink) {
        let combatant = self.get_mut(target);
        if combatant.ailments.contains(Ailments::SLEEP) {
            combatant.ailments.remove(Ailments::SLEEP);
            sink.notify(BattleEvent::AilmentRemoved {
                combatant: target,
                ailment: Ailments::SLEEP,
            });
        }
    }
}
