//! Spell catalogue: identities, target shapes and battle effects.
//!
//! [`Spell`] ids are stable because they travel inside packed CastSpell
//! parameters. Costs and flags come from a [`SpellOracle`]; the built-in
//! [`StandardSpells`] table can be replaced by data-driven catalogues.

use bitflags::bitflags;
use strum::{Display, EnumIter, FromRepr};

use crate::state::Ailments;

/// Spells known to the battle rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Spell {
    // healing
    HealingHand = 1,
    RemoveFear = 2,
    MediumHealing = 11,
    DispellUndead = 12,
    DestroyUndead = 13,
    HolyWord = 14,
    GreatHealing = 18,
    MassHealing = 19,
    Hurry = 21,
    MassHurry = 22,
    // alchemistic
    GhostWeapon = 36,
    Blink = 37,
    Escape = 38,
    // mystic
    MonsterKnowledge = 61,
    ShowMonsterLP = 62,
    MagicalProjectile = 66,
    MagicalArrows = 67,
    LPStealer = 68,
    SPStealer = 69,
    DissolveVictim = 70,
    // destruction
    Lame = 91,
    Poison = 92,
    Petrify = 93,
    CauseDisease = 94,
    CauseAging = 95,
    Irritate = 96,
    CauseMadness = 97,
    Sleep = 98,
    Fear = 99,
    Blind = 100,
    Drug = 101,
    Mudsling = 102,
    Rockfall = 103,
    Earthslide = 104,
    Earthquake = 105,
    Winddevil = 106,
    Windhowler = 107,
    Thunderbolt = 108,
    Whirlwind = 109,
    Firebeam = 110,
    Fireball = 111,
    Firestorm = 112,
    Firepillar = 113,
    Waterfall = 114,
    Iceball = 115,
    Icestorm = 116,
    Iceshower = 117,
}

impl Spell {
    pub const fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::from_repr(id)
    }

    pub const fn school(self) -> SpellSchool {
        match self as u16 {
            0..=30 => SpellSchool::Healing,
            31..=60 => SpellSchool::Alchemistic,
            61..=90 => SpellSchool::Mystic,
            _ => SpellSchool::Destruction,
        }
    }

    /// What the spell does to each target once deflection and immunity
    /// checks have passed.
    pub const fn effect(self) -> SpellEffect {
        use SpellEffect::*;
        match self {
            Spell::GhostWeapon => Damage { base: 25, variable: 0 },
            Spell::Mudsling => Damage { base: 4, variable: 4 },
            Spell::Rockfall => Damage { base: 10, variable: 15 },
            Spell::Earthslide => Damage { base: 8, variable: 8 },
            Spell::Earthquake => Damage { base: 8, variable: 14 },
            Spell::Winddevil => Damage { base: 8, variable: 8 },
            Spell::Windhowler => Damage { base: 16, variable: 32 },
            Spell::Thunderbolt => Damage { base: 20, variable: 12 },
            Spell::Whirlwind => Damage { base: 20, variable: 15 },
            Spell::Firebeam => Damage { base: 20, variable: 10 },
            Spell::Fireball => Damage { base: 40, variable: 45 },
            Spell::Firestorm => Damage { base: 35, variable: 30 },
            Spell::Firepillar => Damage { base: 40, variable: 30 },
            Spell::Waterfall => Damage { base: 32, variable: 28 },
            Spell::Iceball => Damage { base: 90, variable: 90 },
            Spell::Icestorm => Damage { base: 64, variable: 64 },
            Spell::Iceshower => Damage { base: 128, variable: 128 },
            Spell::MagicalProjectile | Spell::MagicalArrows => HalfLevelDamage,
            Spell::LPStealer => StealHitPoints,
            Spell::SPStealer => StealSpellPoints,
            Spell::Lame => Afflict(Ailments::LAMED),
            Spell::Poison => Afflict(Ailments::POISONED),
            Spell::Petrify => Afflict(Ailments::PETRIFIED),
            Spell::CauseDisease => Afflict(Ailments::DISEASED),
            Spell::CauseAging => Afflict(Ailments::AGING),
            Spell::Irritate => Afflict(Ailments::IRRITATED),
            Spell::CauseMadness => Afflict(Ailments::CRAZY),
            Spell::Sleep => Afflict(Ailments::SLEEP),
            Spell::Fear => Afflict(Ailments::PANIC),
            Spell::Blind => Afflict(Ailments::BLIND),
            Spell::Drug => Afflict(Ailments::DRUGGED),
            Spell::DissolveVictim
            | Spell::DispellUndead
            | Spell::DestroyUndead
            | Spell::HolyWord => Dissolve,
            Spell::Blink => Blink,
            Spell::Escape => Escape,
            Spell::MonsterKnowledge => MonsterKnowledge,
            Spell::ShowMonsterLP => ShowMonsterLP,
            Spell::Hurry | Spell::MassHurry => Hurry,
            Spell::HealingHand
            | Spell::RemoveFear
            | Spell::MediumHealing
            | Spell::GreatHealing
            | Spell::MassHealing => External,
        }
    }

    /// Spells that only affect undead.
    pub const fn targets_undead_only(self) -> bool {
        matches!(
            self,
            Spell::DispellUndead | Spell::DestroyUndead | Spell::HolyWord
        )
    }
}

/// Per-target effect of a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellEffect {
    /// `max(1, base + random_int(0, variable))` damage.
    Damage { base: u32, variable: u32 },
    /// `max(1, caster level / 2)` damage.
    HalfLevelDamage,
    /// Damage equal to the caster level; the caster heals by the same amount.
    StealHitPoints,
    /// Drains spell points equal to the caster level into the caster.
    StealSpellPoints,
    Afflict(Ailments),
    /// Removes the target from the battle outright.
    Dissolve,
    Blink,
    Escape,
    MonsterKnowledge,
    ShowMonsterLP,
    Hurry,
    /// Resolved by the host (healing and similar friend spells).
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellSchool {
    Healing,
    Alchemistic,
    Mystic,
    Destruction,
}

impl SpellSchool {
    pub const fn as_flag(self) -> SpellSchools {
        match self {
            Self::Healing => SpellSchools::HEALING,
            Self::Alchemistic => SpellSchools::ALCHEMISTIC,
            Self::Mystic => SpellSchools::MYSTIC,
            Self::Destruction => SpellSchools::DESTRUCTION,
        }
    }
}

bitflags! {
    /// Set of spell schools, used for per-combatant immunity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SpellSchools: u8 {
        const HEALING = 1 << 0;
        const ALCHEMISTIC = 1 << 1;
        const MYSTIC = 1 << 2;
        const DESTRUCTION = 1 << 3;
    }
}

/// Target shape of a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellTarget {
    None,
    SingleEnemy,
    SingleFriend,
    AllEnemies,
    AllFriends,
    EnemyRow,
    FriendRow,
    /// Any slot; used by Blink with an encoded destination.
    BattleField,
}

impl SpellTarget {
    pub const fn targets_enemy(self) -> bool {
        matches!(self, Self::SingleEnemy | Self::AllEnemies | Self::EnemyRow)
    }
}

/// Catalogue entry for a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellInfo {
    pub spell: Spell,
    pub target: SpellTarget,
    pub sp_cost: u32,
    pub castable_by_monster: bool,
}

impl SpellInfo {
    /// Whether casting against a petrified target fizzles.
    pub fn fails_against_petrified(&self) -> bool {
        matches!(
            self.spell.effect(),
            SpellEffect::Damage { .. }
                | SpellEffect::HalfLevelDamage
                | SpellEffect::StealHitPoints
                | SpellEffect::StealSpellPoints
                | SpellEffect::Afflict(_)
        )
    }
}

/// Read-only spell catalogue.
pub trait SpellOracle: Send + Sync {
    fn info(&self, spell: Spell) -> SpellInfo;
}

/// Built-in spell table.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSpells;

impl StandardSpells {
    pub const fn info(spell: Spell) -> SpellInfo {
        use SpellTarget::*;
        let (target, sp_cost, castable_by_monster) = match spell {
            Spell::HealingHand => (SingleFriend, 3, false),
            Spell::RemoveFear => (SingleFriend, 5, false),
            Spell::MediumHealing => (SingleFriend, 10, false),
            Spell::GreatHealing => (SingleFriend, 30, false),
            Spell::MassHealing => (AllFriends, 50, false),
            Spell::Hurry => (SingleFriend, 10, false),
            Spell::MassHurry => (AllFriends, 40, false),
            Spell::DispellUndead => (SingleEnemy, 10, false),
            Spell::DestroyUndead => (SingleEnemy, 20, false),
            Spell::HolyWord => (AllEnemies, 50, false),
            Spell::GhostWeapon => (SingleEnemy, 10, true),
            Spell::Blink => (BattleField, 5, false),
            Spell::Escape => (None, 15, false),
            Spell::MonsterKnowledge => (SingleEnemy, 5, false),
            Spell::ShowMonsterLP => (None, 5, false),
            Spell::MagicalProjectile => (SingleEnemy, 2, true),
            Spell::MagicalArrows => (AllEnemies, 10, true),
            Spell::LPStealer => (SingleEnemy, 20, true),
            Spell::SPStealer => (SingleEnemy, 10, true),
            Spell::DissolveVictim => (SingleEnemy, 50, true),
            Spell::Lame => (SingleEnemy, 7, true),
            Spell::Poison => (SingleEnemy, 8, true),
            Spell::Petrify => (SingleEnemy, 25, true),
            Spell::CauseDisease => (SingleEnemy, 15, true),
            Spell::CauseAging => (SingleEnemy, 20, true),
            Spell::Irritate => (EnemyRow, 10, true),
            Spell::CauseMadness => (SingleEnemy, 25, true),
            Spell::Sleep => (EnemyRow, 20, true),
            Spell::Fear => (EnemyRow, 20, true),
            Spell::Blind => (SingleEnemy, 10, true),
            Spell::Drug => (SingleEnemy, 15, true),
            Spell::Mudsling => (SingleEnemy, 5, true),
            Spell::Rockfall => (SingleEnemy, 12, true),
            Spell::Earthslide => (EnemyRow, 15, true),
            Spell::Earthquake => (AllEnemies, 25, true),
            Spell::Winddevil => (SingleEnemy, 10, true),
            Spell::Windhowler => (AllEnemies, 30, true),
            Spell::Thunderbolt => (SingleEnemy, 20, true),
            Spell::Whirlwind => (EnemyRow, 30, true),
            Spell::Firebeam => (SingleEnemy, 25, true),
            Spell::Fireball => (SingleEnemy, 40, true),
            Spell::Firestorm => (EnemyRow, 45, true),
            Spell::Firepillar => (AllEnemies, 55, true),
            Spell::Waterfall => (SingleEnemy, 45, true),
            Spell::Iceball => (SingleEnemy, 80, true),
            Spell::Icestorm => (EnemyRow, 90, true),
            Spell::Iceshower => (AllEnemies, 120, true),
        };
        SpellInfo {
            spell,
            target,
            sp_cost,
            castable_by_monster,
        }
    }
}

impl SpellOracle for StandardSpells {
    fn info(&self, spell: Spell) -> SpellInfo {
        StandardSpells::info(spell)
    }
}
