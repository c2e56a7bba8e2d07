//! Execution of individual queued actions.

use tracing::{debug, warn};

use super::{
    AnimationKind, Battle, BattleError, BattleEvent, BattleMessage, BrokenItem, PresentationSink,
    Resume, TextColor,
};
use crate::action::{
    AttackParam, BattleActionKind, CastSpellParam, FollowUpFlags, HurtParam, ItemSource,
    MoveParam, PackedParam, QueuedAction,
};
use crate::combat::{AttackContext, AttackResult, DamageBuffs, resolve_attack};
use crate::config::BattleConfig;
use crate::env::{AmmunitionType, ItemDefinition, ItemKind};
use crate::state::{CombatantId, EquipmentSlot, ItemId, ItemSlot, ItemSlotFlags, Side, Slot};

impl Battle {
    pub(super) fn run_action(
        &mut self,
        action: QueuedAction,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        debug!(actor = %action.actor, kind = %action.kind, "running action");
        self.current = Some(action);
        sink.notify(BattleEvent::ActionStarted(action));

        let actor = action.actor;
        if self.hurried.contains(&actor) && self.queue.has_pending(actor, BattleActionKind::Attack) {
            self.hurried.retain(|&id| id != actor);
            self.queue.unskip_actor(actor);
        }

        match action.kind {
            BattleActionKind::DropWeapon => {
                let actor_name = self.name(actor);
                sink.show_message(
                    BattleMessage::DroppedWeapon { actor: actor_name },
                    TextColor::BrightGray,
                );
                self.proceed(Resume::Finish { needs_click: true }, sink)
            }
            BattleActionKind::DisplayActionText => self.display_action_text(actor, sink),
            BattleActionKind::Move => self.move_action(actor, MoveParam::decode(action.param)?, sink),
            BattleActionKind::MoveGroupForward => {
                self.step_monsters_forward(sink)?;
                self.finish_action(false, sink);
                Ok(())
            }
            BattleActionKind::Attack => {
                self.attack(actor, AttackParam::decode(action.param)?, sink)
            }
            BattleActionKind::CastSpell => {
                self.cast_spell(actor, CastSpellParam::decode(action.param)?, sink)
            }
            BattleActionKind::Flee => self.flee(actor, sink),
            BattleActionKind::WeaponBreak => self.weapon_break(action, sink),
            BattleActionKind::ArmorBreak => self.defender_break(
                action,
                FollowUpFlags::BREAK_ARMOR,
                EquipmentSlot::Body,
                sink,
            ),
            BattleActionKind::DefenderWeaponBreak => self.defender_break(
                action,
                FollowUpFlags::BREAK_DEFENDER_WEAPON,
                EquipmentSlot::RightHand,
                sink,
            ),
            BattleActionKind::DefenderShieldBreak => self.defender_break(
                action,
                FollowUpFlags::BREAK_DEFENDER_SHIELD,
                EquipmentSlot::LeftHand,
                sink,
            ),
            BattleActionKind::LastAmmo => self.last_ammo(action, sink),
            BattleActionKind::Hurt => self.hurt(action, sink),
            kind @ (BattleActionKind::None | BattleActionKind::Parry) => {
                Err(BattleError::InvalidQueuedAction { kind })
            }
        }
    }

    /// Announces the entry behind this one, coloured by its actor.
    fn display_action_text(
        &mut self,
        actor: CombatantId,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let Some(&next) = self.queue.peek() else {
            return Err(BattleError::FollowUpWithoutSuccessor {
                kind: BattleActionKind::DisplayActionText,
            });
        };
        let color = self.color_of(next.actor);
        let name = self.name(next.actor);

        let message = match next.kind {
            BattleActionKind::Move => {
                let target = MoveParam::decode(next.param)?.target;
                let current_row = self.field.slot_of(next.actor).map(Slot::row);
                let retreat = self.get(next.actor).is_monster()
                    && current_row.is_some_and(|row| target.row() < row);
                if retreat {
                    BattleMessage::Retreats { actor: name }
                } else {
                    BattleMessage::Moves { actor: name }
                }
            }
            BattleActionKind::Flee => BattleMessage::Flees { actor: name },
            BattleActionKind::Attack => {
                let param = AttackParam::decode(next.param)?;
                match self.field.occupant(param.target) {
                    None => {
                        self.queue.pop();
                        let weapon = self.weapon_definition(param.weapon)?;
                        if self.check_ammo(next.actor, weapon.as_ref(), param.ammunition, sink)? {
                            self.queue.skip_actor(next.actor);
                        }
                        if self.is_party(next.actor) {
                            sink.notify(BattleEvent::PlayerLostTarget(next.actor));
                        }
                        BattleMessage::MissedTarget { actor: name }
                    }
                    Some(target) => {
                        let weapon = param
                            .weapon
                            .map(|id| self.env.item(id).map(|def| def.name.clone()))
                            .transpose()?;
                        BattleMessage::Attacks {
                            actor: name,
                            target: self.name(target),
                            weapon,
                        }
                    }
                }
            }
            BattleActionKind::CastSpell => {
                let param = CastSpellParam::decode(next.param)?;
                let item = param
                    .item
                    .and_then(|source| self.item_at(next.actor, source))
                    .map(|id| self.env.item(id).map(|def| def.name.clone()))
                    .transpose()?;
                BattleMessage::Casts {
                    actor: name,
                    spell: param.spell,
                    item,
                }
            }
            BattleActionKind::MoveGroupForward => {
                if self.get(next.actor).is_monster() {
                    BattleMessage::MonstersAdvance
                } else {
                    BattleMessage::PartyAdvances
                }
            }
            kind => {
                warn!(actor = %actor, %kind, "nothing to announce");
                self.finish_action(false, sink);
                return Ok(());
            }
        };
        sink.show_message(message, color);
        self.proceed(Resume::Finish { needs_click: true }, sink)
    }

    fn move_action(
        &mut self,
        actor: CombatantId,
        param: MoveParam,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let color = self.color_of(actor);
        let name = self.name(actor);
        let Some(from) = self.field.slot_of(actor) else {
            warn!(%actor, "mover left the battlefield");
            self.finish_action(false, sink);
            return Ok(());
        };

        if !self.get(actor).ailments.can_move() {
            sink.show_message(BattleMessage::CannotMove { actor: name }, color);
            return self.proceed(Resume::Finish { needs_click: true }, sink);
        }
        if !self.field.is_free(param.target) {
            sink.show_message(BattleMessage::WayBlocked { actor: name }, color);
            return self.proceed(Resume::Finish { needs_click: true }, sink);
        }

        let resume = Resume::CompleteMove {
            actor,
            target: param.target,
        };
        if self.get(actor).is_monster() {
            self.animate(
                AnimationKind::MonsterMove {
                    monster: actor,
                    from,
                    to: param.target,
                },
                resume,
                sink,
            )
        } else {
            self.proceed(resume, sink)
        }
    }

    pub(super) fn complete_move(
        &mut self,
        actor: CombatantId,
        target: Slot,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let from = self.field.move_to(actor, target)?;
        sink.notify(BattleEvent::CombatantMoved {
            combatant: actor,
            from,
            to: target,
        });
        self.finish_action(false, sink);
        Ok(())
    }

    /// Every monster steps one row towards the party, front rows first.
    pub(super) fn step_monsters_forward(
        &mut self,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let mut monsters: Vec<(Slot, CombatantId)> = self
            .field
            .occupied()
            .filter(|&(slot, id)| {
                self.get(id).is_monster() && slot.row() < BattleConfig::MONSTER_MAX_ROW
            })
            .collect();
        monsters.sort_by_key(|&(slot, _)| std::cmp::Reverse(slot.row()));

        for (from, monster) in monsters {
            let Some(to) = Slot::at(from.column(), from.row() + 1) else {
                continue;
            };
            if !self.field.is_free(to) {
                continue;
            }
            self.field.move_to(monster, to)?;
            sink.notify(BattleEvent::CombatantMoved {
                combatant: monster,
                from,
                to,
            });
        }
        Ok(())
    }

    fn buffs_for(&self, attacker: CombatantId, target: CombatantId) -> DamageBuffs {
        DamageBuffs {
            attack: if self.is_party(attacker) {
                self.active_spells.attack
            } else {
                0
            },
            protection: if self.is_party(target) {
                self.active_spells.protection
            } else {
                0
            },
        }
    }

    fn weapon_definition(&self, weapon: Option<ItemId>) -> Result<Option<ItemDefinition>, BattleError> {
        weapon.map(|id| self.env.item(id).cloned()).transpose()
    }

    fn attack(
        &mut self,
        actor: CombatantId,
        param: AttackParam,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let Some(target) = self.field.occupant(param.target) else {
            if let Some(next) = self.queue.peek().map(|next| next.param) {
                self.queue
                    .set_next_param(HurtParam::update_raw(next, 0, AttackResult::Missed));
            }
            self.finish_action(false, sink);
            return Ok(());
        };

        let context = AttackContext {
            target_parrying: self.parrying.contains(&target),
            buffs: self.buffs_for(actor, target),
        };
        let outcome = resolve_attack(
            &self.combatants[actor.index()],
            Some(&self.combatants[target.index()]),
            context,
            self.env.rng(),
        );
        debug!(%actor, %target, result = %outcome.result, damage = outcome.damage, "attack resolved");

        if outcome.abort {
            self.queue.skip_current_chain(actor);
        }
        if outcome.result == AttackResult::Missed && self.is_party(actor) {
            sink.notify(BattleEvent::PlayerLostTarget(actor));
        }
        let next = self
            .queue
            .peek()
            .map(|next| next.param)
            .ok_or(BattleError::FollowUpWithoutSuccessor {
                kind: BattleActionKind::Attack,
            })?;
        self.queue
            .set_next_param(HurtParam::update_raw(next, outcome.damage, outcome.result));

        if outcome.result == AttackResult::Petrified {
            if self.get(target).is_monster() {
                sink.show_message(BattleMessage::CannotDamagePetrified, self.color_of(actor));
                return self.proceed(Resume::Finish { needs_click: true }, sink);
            }
            sink.clear_message();
            self.finish_action(true, sink);
            return Ok(());
        }

        if outcome.damage != 0 {
            let tracked = if outcome.result == AttackResult::CriticalHit {
                self.get(target).hit_points.maximum
            } else {
                outcome.damage
            };
            self.tracker.record(actor, tracked);
        }

        let weapon = self.weapon_definition(param.weapon)?;
        self.check_ammo(actor, weapon.as_ref(), param.ammunition, sink)?;
        if outcome.result.rolls_breakage() {
            self.roll_breakage(actor, target, weapon.as_ref(), outcome.result)?;
        }

        let name = self.name(actor);
        let message = match outcome.result {
            AttackResult::Failed => BattleMessage::AttackFailed { actor: name },
            AttackResult::NoDamage => BattleMessage::NoDamage { actor: name },
            AttackResult::Missed => BattleMessage::MissedTarget { actor: name },
            AttackResult::Blocked => BattleMessage::AttackParried { actor: name },
            AttackResult::Protected => BattleMessage::CannotPenetrateAura { actor: name },
            AttackResult::CriticalHit => BattleMessage::CriticalHit { actor: name },
            AttackResult::Damage | AttackResult::Petrified => BattleMessage::DealtDamage {
                actor: name,
                damage: outcome.damage,
            },
        };

        let ranged = match weapon.as_ref().filter(|def| def.is_long_ranged()) {
            None => None,
            Some(def) => {
                let ammunition = def.required_ammunition();
                if self.get(actor).is_monster() && ammunition == Some(AmmunitionType::SlingDagger) {
                    return Err(BattleError::UnsupportedAmmunition { weapon: def.id });
                }
                Some(ammunition)
            }
        };
        self.animate(
            AnimationKind::Attack {
                attacker: actor,
                target: param.target,
                ranged,
            },
            Resume::AttackMessage {
                message,
                color: self.color_of(actor),
            },
            sink,
        )
    }

    /// Spends one unit of ammunition for a long-ranged weapon that needs it.
    ///
    /// Inventory stacks are used before the off-hand. Returns false when the
    /// last unit was used, in which case the attacker's later turns are
    /// skipped and the follow-up chain is flagged.
    fn check_ammo(
        &mut self,
        actor: CombatantId,
        weapon: Option<&ItemDefinition>,
        ammunition: Option<ItemId>,
        sink: &mut dyn PresentationSink,
    ) -> Result<bool, BattleError> {
        let Some(weapon) = weapon.filter(|def| def.is_long_ranged()) else {
            return Ok(true);
        };
        if weapon.required_ammunition().is_none() {
            return Ok(true);
        }
        let ammo = ammunition.ok_or(BattleError::MissingAmmunition { combatant: actor })?;

        let combatant = &mut self.combatants[actor.index()];
        let last_used = match combatant.inventory.position(|id| id == ammo) {
            Some(index) => {
                let emptied = combatant
                    .inventory
                    .get_mut(index)
                    .is_some_and(ItemSlot::take_one);
                let off_hand = combatant.equipment.get(EquipmentSlot::LeftHand);
                emptied
                    && combatant.inventory.position(|id| id == ammo).is_none()
                    && (off_hand.item != Some(ammo) || off_hand.is_empty())
            }
            None => {
                let off_hand = combatant.equipment.get_mut(EquipmentSlot::LeftHand);
                if off_hand.item != Some(ammo) || off_hand.is_empty() {
                    return Err(BattleError::MissingAmmunition { combatant: actor });
                }
                off_hand.take_one()
            }
        };

        if last_used {
            debug!(%actor, "last ammunition used");
            if let Some(next) = self.queue.peek().map(|next| next.param) {
                self.queue
                    .set_next_param(HurtParam::flag_raw(next, FollowUpFlags::LAST_AMMO));
            }
            self.queue.skip_following_turns(actor);
            if self.is_party(actor) {
                sink.notify(BattleEvent::PlayerLastAmmoUsed(actor));
            }
        }
        Ok(!last_used)
    }

    fn breaks(&mut self, item: ItemId) -> Result<bool, BattleError> {
        let chance = self.env.item(item)?.break_chance;
        Ok(chance > 0 && self.env.rng().random_int(0, BattleConfig::BREAK_ROLL_MAX) < i32::from(chance))
    }

    /// Rolls weapon, shield and armor breakage and flags the chain.
    fn roll_breakage(
        &mut self,
        actor: CombatantId,
        target: CombatantId,
        weapon: Option<&ItemDefinition>,
        result: AttackResult,
    ) -> Result<(), BattleError> {
        let mut flags = FollowUpFlags::empty();

        if let Some(weapon) = weapon {
            if self.breaks(weapon.id)? {
                flags |= FollowUpFlags::BREAK_WEAPON;
                self.queue.skip_following_turns(actor);
            }
        }

        let equipment = &self.get(target).equipment;
        if result == AttackResult::Blocked {
            let defender_weapon = equipment.item(EquipmentSlot::RightHand);
            let shield = equipment
                .item(EquipmentSlot::LeftHand)
                .filter(|&id| Some(id) != defender_weapon);
            if let Some(id) = defender_weapon {
                if self.breaks(id)? {
                    flags |= FollowUpFlags::BREAK_DEFENDER_WEAPON;
                    if self.is_party(target) {
                        self.queue.skip_following_turns(target);
                    }
                }
            }
            if let Some(id) = shield {
                if self.breaks(id)? {
                    flags |= FollowUpFlags::BREAK_DEFENDER_SHIELD;
                }
            }
        } else if let Some(armor) = equipment.item(EquipmentSlot::Body) {
            if self.breaks(armor)? {
                flags |= FollowUpFlags::BREAK_ARMOR;
            }
        }

        if !flags.is_empty() {
            debug!(%actor, %target, ?flags, "equipment breaks");
            if let Some(next) = self.queue.peek().map(|next| next.param) {
                self.queue.set_next_param(HurtParam::flag_raw(next, flags));
            }
        }
        Ok(())
    }

    /// Hands a follow-up parameter on to the next chain entry.
    fn forward_param(&mut self, action: QueuedAction) -> Result<HurtParam, BattleError> {
        if !self.queue.set_next_param(action.param) {
            return Err(BattleError::FollowUpWithoutSuccessor { kind: action.kind });
        }
        Ok(HurtParam::decode(action.param)?)
    }

    fn record_broken(&mut self, removed: ItemSlot) {
        if let Some(item) = removed.item {
            self.broken_items.push(BrokenItem {
                item,
                cursed: removed.flags.contains(ItemSlotFlags::CURSED),
            });
        }
    }

    fn weapon_break(
        &mut self,
        action: QueuedAction,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let hurt = self.forward_param(action)?;
        let actor = action.actor;
        let weapon = self.get(actor).equipment.weapon();
        let Some(weapon) = weapon.filter(|_| hurt.flags.contains(FollowUpFlags::BREAK_WEAPON)) else {
            self.finish_action(false, sink);
            return Ok(());
        };
        let definition = self.env.item(weapon)?.clone();

        let combatant = self.get_mut(actor);
        if definition.is_two_handed() {
            combatant.equipment.get_mut(EquipmentSlot::LeftHand).clear();
        }
        let removed = combatant.equipment.take(EquipmentSlot::RightHand);
        self.record_broken(removed);
        sink.show_message(
            BattleMessage::ItemBroken {
                owner: self.name(actor),
                item: definition.name.clone(),
            },
            self.color_of(actor),
        );

        if self.is_party(actor) {
            sink.notify(BattleEvent::PlayerWeaponBroke(actor));
        } else {
            if definition.is_long_ranged() {
                self.swap_in_melee_weapon(actor);
            }
            if self.get(actor).combat.base_attack == 0 {
                self.get_mut(actor).halve_morale();
            }
        }
        self.proceed(Resume::Finish { needs_click: true }, sink)
    }

    /// A monster that lost its ranged weapon draws the first melee weapon it
    /// carries.
    fn swap_in_melee_weapon(&mut self, monster: CombatantId) {
        let items = self.env.items();
        let combatant = &mut self.combatants[monster.index()];
        let melee = combatant.inventory.position(|id| {
            items
                .definition(id)
                .is_some_and(|def| def.kind == ItemKind::CloseRangeWeapon)
        });
        if let Some(index) = melee {
            if let Some(slot) = combatant.inventory.get_mut(index) {
                let drawn = std::mem::take(slot);
                *combatant.equipment.get_mut(EquipmentSlot::RightHand) = drawn;
            }
        }
    }

    fn defender_break(
        &mut self,
        action: QueuedAction,
        flag: FollowUpFlags,
        slot: EquipmentSlot,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let hurt = self.forward_param(action)?;
        if !hurt.flags.contains(flag) {
            self.finish_action(false, sink);
            return Ok(());
        }
        let Some(target) = self.field.occupant(hurt.target) else {
            warn!(kind = %action.kind, slot = %hurt.target, "breakage target left the battlefield");
            self.finish_action(false, sink);
            return Ok(());
        };
        let removed = self.get_mut(target).equipment.take(slot);
        let Some(item) = removed.item else {
            self.finish_action(false, sink);
            return Ok(());
        };
        let item_name = self.env.item(item)?.name.clone();
        self.record_broken(removed);
        sink.show_message(
            BattleMessage::ItemBroken {
                owner: self.name(target),
                item: item_name,
            },
            self.color_of(target),
        );
        self.proceed(Resume::Finish { needs_click: true }, sink)
    }

    fn last_ammo(
        &mut self,
        action: QueuedAction,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let hurt = self.forward_param(action)?;
        if !hurt.flags.contains(FollowUpFlags::LAST_AMMO) {
            self.finish_action(false, sink);
            return Ok(());
        }
        let actor = action.actor;
        sink.show_message(
            BattleMessage::LastAmmunition {
                actor: self.name(actor),
            },
            self.color_of(actor),
        );
        if self.get(actor).is_monster() {
            self.dropped_weapon.push(actor);
        }
        self.proceed(Resume::Finish { needs_click: true }, sink)
    }

    fn hurt(&mut self, action: QueuedAction, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let hurt = HurtParam::decode(action.param)?;
        sink.clear_message();
        let target = self.field.occupant(hurt.target);
        let Some(target) = target.filter(|_| hurt.result.deals_damage()) else {
            self.finish_action(false, sink);
            return Ok(());
        };

        let damage = u32::from(hurt.damage);
        let combatant = self.get(target);
        let shown = if combatant.is_party_member() {
            damage.min(combatant.hit_points.current)
        } else {
            damage
        };
        sink.notify(BattleEvent::DamageDisplayed {
            combatant: target,
            slot: hurt.target,
            damage: shown,
        });
        self.wake(target, sink);
        self.get_mut(target).take_damage(damage);
        self.animate(
            AnimationKind::Hurt {
                combatant: target,
                slot: hurt.target,
            },
            Resume::HurtLanded {
                attacker: action.actor,
                target,
            },
            sink,
        )
    }

    fn flee(&mut self, actor: CombatantId, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let Some(slot) = self.field.slot_of(actor) else {
            self.finish_action(false, sink);
            return Ok(());
        };
        if self.get(actor).is_monster() {
            self.animate(
                AnimationKind::MonsterFlee {
                    monster: actor,
                    slot,
                },
                Resume::CompleteFlee { actor },
                sink,
            )
        } else {
            self.complete_flee(actor, sink)
        }
    }

    pub(super) fn complete_flee(
        &mut self,
        actor: CombatantId,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        debug!(%actor, "fled");
        self.fled.push(actor);
        self.remove_from_field(actor, sink);
        if let Some(current) = self.current.take() {
            sink.notify(BattleEvent::ActionCompleted(current));
        }

        let monster = self.get(actor).is_monster();
        if monster && self.monsters_on_field().next().is_none() {
            self.end_battle(true, sink);
        } else if !monster && self.side_on_field(Side::Party).next().is_none() {
            self.end_battle(false, sink);
        } else {
            self.ready = true;
        }
        Ok(())
    }

    /// Item a spell is cast from, if the source slot still holds one.
    pub(super) fn item_at(&self, owner: CombatantId, source: ItemSource) -> Option<ItemId> {
        let combatant = self.get(owner);
        match source {
            ItemSource::Equipment(slot) => combatant.equipment.item(slot),
            ItemSource::Inventory(index) => combatant.inventory.get(usize::from(index))?.item,
        }
    }
}
