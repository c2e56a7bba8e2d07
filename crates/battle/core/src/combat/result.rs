//! Attack outcomes.

use strum::{Display, FromRepr};

/// Outcome of a physical attack, carried in three bits of the follow-up
/// parameter.
///
/// None of these are errors: misses, parries and immunities are ordinary
/// results reported through messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AttackResult {
    #[default]
    Damage = 0,
    /// The attacker's Attack roll failed.
    Failed = 1,
    /// Damage rolled at or below zero.
    NoDamage = 2,
    /// Nobody stood on the target square.
    Missed = 3,
    /// The target parried.
    Blocked = 4,
    /// Magic defense exceeds the weapon's magic level.
    Protected = 5,
    Petrified = 6,
    CriticalHit = 7,
}

impl AttackResult {
    /// Whether the follow-up Hurt step applies damage.
    pub const fn deals_damage(self) -> bool {
        matches!(self, Self::Damage | Self::CriticalHit)
    }

    /// Whether weapon and armor breakage is rolled after this outcome.
    pub const fn rolls_breakage(self) -> bool {
        !matches!(self, Self::Missed | Self::Failed)
    }
}

/// Attack outcome plus damage and whether the attacker's chain is aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackResolution {
    pub result: AttackResult,
    pub damage: u32,
    /// Remaining chain entries of this attack must be skipped.
    pub abort: bool,
}

impl AttackResolution {
    pub const fn aborted(result: AttackResult) -> Self {
        Self {
            result,
            damage: 0,
            abort: true,
        }
    }

    pub const fn landed(result: AttackResult, damage: u32) -> Self {
        Self {
            result,
            damage,
            abort: false,
        }
    }
}
