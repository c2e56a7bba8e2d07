//! Presentation boundary: everything the battle wants the host to show.
//!
//! The engine never renders. It reports state changes as [`BattleEvent`]s,
//! text as [`BattleMessage`]s, and asks for animations with an
//! [`AnimationRequest`]. A sink that plays animations asynchronously answers
//! [`AnimationProgress::Pending`] and later calls
//! [`Battle::animation_finished`](crate::engine::Battle::animation_finished)
//! with the request's ticket; a headless sink answers
//! [`AnimationProgress::Finished`] and the battle continues inline.

use std::fmt;

use crate::action::QueuedAction;
use crate::env::{AmmunitionType, Spell};
use crate::state::{Ailments, CombatantId, ItemId, Slot};

/// Text colour of a battle message, keyed by who acts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextColor {
    BattlePlayer,
    BattleMonster,
    BrightGray,
}

/// Battle log line. Names are resolved when the message is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleMessage {
    Attacks {
        actor: String,
        target: String,
        weapon: Option<String>,
    },
    Casts {
        actor: String,
        spell: Spell,
        item: Option<String>,
    },
    Moves { actor: String },
    Retreats { actor: String },
    Flees { actor: String },
    MonstersAdvance,
    PartyAdvances,
    CannotMove { actor: String },
    WayBlocked { actor: String },
    DroppedWeapon { actor: String },
    AttackFailed { actor: String },
    NoDamage { actor: String },
    MissedTarget { actor: String },
    AttackParried { actor: String },
    CannotPenetrateAura { actor: String },
    CriticalHit { actor: String },
    DealtDamage { actor: String, damage: u32 },
    CannotDamagePetrified,
    ItemBroken { owner: String, item: String },
    LastAmmunition { actor: String },
    SpellFailed { actor: String },
    DeflectedSpell { target: String },
    ImmuneToSpellType { target: String },
    ImmuneToSpell { target: String },
    HasBlinked { target: String },
}

impl fmt::Display for BattleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacks {
                actor,
                target,
                weapon: Some(weapon),
            } => write!(f, "{actor} attacks {target} with {weapon}"),
            Self::Attacks { actor, target, .. } => write!(f, "{actor} attacks {target}"),
            Self::Casts {
                actor,
                spell,
                item: Some(item),
            } => write!(f, "{actor} casts {spell} from {item}"),
            Self::Casts { actor, spell, .. } => write!(f, "{actor} casts {spell}"),
            Self::Moves { actor } => write!(f, "{actor} moves"),
            Self::Retreats { actor } => write!(f, "{actor} retreats"),
            Self::Flees { actor } => write!(f, "{actor} flees"),
            Self::MonstersAdvance => f.write_str("The monsters advance"),
            Self::PartyAdvances => f.write_str("The party advances"),
            Self::CannotMove { actor } => write!(f, "{actor} cannot move"),
            Self::WayBlocked { actor } => write!(f, "{actor}'s way was blocked"),
            Self::DroppedWeapon { actor } => write!(f, "{actor} has dropped weapon"),
            Self::AttackFailed { actor } => write!(f, "{actor}'s attack failed"),
            Self::NoDamage { actor } => write!(f, "{actor} did no damage"),
            Self::MissedTarget { actor } => write!(f, "{actor} missed the target"),
            Self::AttackParried { actor } => write!(f, "{actor}'s attack was parried"),
            Self::CannotPenetrateAura { actor } => {
                write!(f, "{actor} cannot penetrate magical aura")
            }
            Self::CriticalHit { actor } => write!(f, "{actor} made a critical hit"),
            Self::DealtDamage { actor, damage } => {
                write!(f, "{actor} did {damage} points of damage")
            }
            Self::CannotDamagePetrified => f.write_str("Cannot damage petrified monsters"),
            Self::ItemBroken { owner, item } => write!(f, "{owner}'s {item} was broken"),
            Self::LastAmmunition { actor } => write!(f, "{actor} used last ammunition"),
            Self::SpellFailed { actor } => write!(f, "{actor}'s spell failed"),
            Self::DeflectedSpell { target } => write!(f, "{target} deflected the spell"),
            Self::ImmuneToSpellType { target } => {
                write!(f, "{target} is immune to this type of spell")
            }
            Self::ImmuneToSpell { target } => write!(f, "{target} is immune to this spell"),
            Self::HasBlinked { target } => write!(f, "{target} has blinked"),
        }
    }
}

/// Item destroyed during the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrokenItem {
    pub item: ItemId,
    pub cursed: bool,
}

/// Summary handed to the host when the battle is over.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleEndInfo {
    /// True when the party won.
    pub monsters_defeated: bool,
    /// Initial monsters that neither fled nor were dissolved.
    pub killed_monsters: Vec<CombatantId>,
    pub fled_party_members: Vec<CombatantId>,
    /// Defeat experience summed over every initial monster.
    pub total_experience: u32,
    pub broken_items: Vec<BrokenItem>,
}

/// State changes reported to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    ActionStarted(QueuedAction),
    ActionCompleted(QueuedAction),
    RoundFinished { round: u32 },
    CharacterDied(CombatantId),
    BattleEnded(BattleEndInfo),
    PlayerWeaponBroke(CombatantId),
    PlayerLastAmmoUsed(CombatantId),
    /// A party member's planned target is gone; the host should clear it.
    PlayerLostTarget(CombatantId),
    DamageDisplayed {
        combatant: CombatantId,
        slot: Slot,
        damage: u32,
    },
    CombatantMoved {
        combatant: CombatantId,
        from: Slot,
        to: Slot,
    },
    CombatantRemoved {
        combatant: CombatantId,
        slot: Slot,
    },
    AilmentAdded {
        combatant: CombatantId,
        ailment: Ailments,
    },
    AilmentRemoved {
        combatant: CombatantId,
        ailment: Ailments,
    },
    /// A spell whose effect lives outside the battle rules (healing and the
    /// like) landed; the host applies it.
    SpellEffectRequested {
        caster: CombatantId,
        target: Option<CombatantId>,
        spell: Spell,
    },
    MonsterInfoRequested { monster: CombatantId },
    /// The battle waits for [`Battle::submit_click`](crate::engine::Battle::submit_click).
    AcknowledgmentRequired,
}

/// Correlates an animation request with its completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationTicket(pub u64);

impl fmt::Display for AnimationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnimationKind {
    MonsterMove {
        monster: CombatantId,
        from: Slot,
        to: Slot,
    },
    /// `ranged` carries the projectile; `Some(None)` is a thrown sickle.
    Attack {
        attacker: CombatantId,
        target: Slot,
        ranged: Option<Option<AmmunitionType>>,
    },
    Hurt { combatant: CombatantId, slot: Slot },
    Death { combatant: CombatantId, slot: Slot },
    MonsterFlee { monster: CombatantId, slot: Slot },
    Cast { caster: CombatantId },
    BlockSpell { slot: Slot },
    SpellHit { spell: Spell, slot: Slot },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationRequest {
    pub ticket: AnimationTicket,
    pub kind: AnimationKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationProgress {
    Finished,
    Pending,
}

/// Host side of the battle.
pub trait PresentationSink {
    fn notify(&mut self, event: BattleEvent);

    fn show_message(&mut self, message: BattleMessage, color: TextColor);

    fn clear_message(&mut self) {}

    fn request_animation(&mut self, _request: AnimationRequest) -> AnimationProgress {
        AnimationProgress::Finished
    }
}

/// Sink that keeps everything it is told. Animations finish immediately
/// unless `hold_animations` is set.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<BattleEvent>,
    pub messages: Vec<(BattleMessage, TextColor)>,
    pub animations: Vec<AnimationRequest>,
    pub hold_animations: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding_animations() -> Self {
        Self {
            hold_animations: true,
            ..Self::default()
        }
    }

    pub fn message_texts(&self) -> Vec<String> {
        self.messages.iter().map(|(m, _)| m.to_string()).collect()
    }

    pub fn end_info(&self) -> Option<&BattleEndInfo> {
        self.events.iter().find_map(|event| match event {
            BattleEvent::BattleEnded(info) => Some(info),
            _ => None,
        })
    }

    pub fn last_animation(&self) -> Option<AnimationTicket> {
        self.animations.last().map(|request| request.ticket)
    }
}

impl PresentationSink for RecordingSink {
    fn notify(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    fn show_message(&mut self, message: BattleMessage, color: TextColor) {
        self.messages.push((message, color));
    }

    fn request_animation(&mut self, request: AnimationRequest) -> AnimationProgress {
        self.animations.push(request);
        if self.hold_animations {
            AnimationProgress::Pending
        } else {
            AnimationProgress::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_the_battle_log() {
        let attack = BattleMessage::Attacks {
            actor: "Thalion".into(),
            target: "Orc".into(),
            weapon: Some("Sword".into()),
        };
        assert_eq!(attack.to_string(), "Thalion attacks Orc with Sword");
        let damage = BattleMessage::DealtDamage {
            actor: "Orc".into(),
            damage: 12,
        };
        assert_eq!(damage.to_string(), "Orc did 12 points of damage");
        let cast = BattleMessage::Casts {
            actor: "Orc".into(),
            spell: Spell::Fireball,
            item: None,
        };
        assert_eq!(cast.to_string(), "Orc casts Fireball");
    }
}
