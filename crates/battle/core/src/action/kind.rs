use strum::Display;

use crate::action::{AttackParam, CastSpellParam, MoveParam, PackedParam};

/// Tag of a queued battle action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleActionKind {
    None,
    Move,
    /// Every monster steps one row towards the party.
    MoveGroupForward,
    Attack,
    Parry,
    CastSpell,
    Flee,
    /// Announces the following primary action.
    DisplayActionText,
    Hurt,
    WeaponBreak,
    ArmorBreak,
    DefenderWeaponBreak,
    DefenderShieldBreak,
    LastAmmo,
    DropWeapon,
}

impl BattleActionKind {
    /// Steps that trail an Attack and share its packed parameter.
    pub const fn is_follow_up(self) -> bool {
        matches!(
            self,
            Self::WeaponBreak
                | Self::ArmorBreak
                | Self::DefenderWeaponBreak
                | Self::DefenderShieldBreak
                | Self::LastAmmo
                | Self::Hurt
        )
    }

    /// Follow-up steps in queue order after an Attack.
    pub const ATTACK_CHAIN: [Self; 6] = [
        Self::WeaponBreak,
        Self::ArmorBreak,
        Self::DefenderWeaponBreak,
        Self::DefenderShieldBreak,
        Self::LastAmmo,
        Self::Hurt,
    ];
}

/// A decided action for one combatant's turn, before it is expanded into
/// queue entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlannedAction {
    #[default]
    None,
    Move(MoveParam),
    MoveGroupForward,
    Attack(AttackParam),
    Parry,
    CastSpell(CastSpellParam),
    Flee,
}

impl PlannedAction {
    pub fn kind(&self) -> BattleActionKind {
        match self {
            Self::None => BattleActionKind::None,
            Self::Move(_) => BattleActionKind::Move,
            Self::MoveGroupForward => BattleActionKind::MoveGroupForward,
            Self::Attack(_) => BattleActionKind::Attack,
            Self::Parry => BattleActionKind::Parry,
            Self::CastSpell(_) => BattleActionKind::CastSpell,
            Self::Flee => BattleActionKind::Flee,
        }
    }

    pub fn encode(&self) -> u32 {
        match self {
            Self::Move(param) => param.encode(),
            Self::Attack(param) => param.encode(),
            Self::CastSpell(param) => param.encode(),
            Self::None | Self::MoveGroupForward | Self::Parry | Self::Flee => 0,
        }
    }
}
