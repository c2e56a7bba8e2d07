use bitflags::bitflags;

use crate::env::{Spell, SpellSchools};
use crate::state::{Ailments, Equipment, Inventory};

/// Stable arena index of a combatant for the duration of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u16);

impl CombatantId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer resource meter (hit points, spell points).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: u32,
    pub maximum: u32,
}

impl ResourceMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self { current, maximum }
    }

    pub fn full(maximum: u32) -> Self {
        Self::new(maximum, maximum)
    }

    pub fn missing(&self) -> u32 {
        self.maximum.saturating_sub(self.current)
    }

    /// Removes up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let drained = amount.min(self.current);
        self.current -= drained;
        drained
    }

    /// Adds up to `amount` without exceeding the maximum.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.missing());
        self.current += restored;
        restored
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Attributes {
    pub speed: u32,
    pub strength: u32,
    pub stamina: u32,
    pub anti_magic: u32,
}

/// Percentile abilities rolled against `roll_percent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Abilities {
    pub attack: u32,
    pub critical_hit: u32,
    pub parry: u32,
    pub use_magic: u32,
}

/// Flat combat values with equipment already applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatValues {
    pub base_attack: i32,
    pub variable_attack: i32,
    pub base_defense: i32,
    pub variable_defense: i32,
    /// Magic weapon level; negative when the attack is not magical.
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub attacks_per_round: u32,
}

impl Default for CombatValues {
    fn default() -> Self {
        Self {
            base_attack: 0,
            variable_attack: 0,
            base_defense: 0,
            variable_defense: 0,
            magic_attack: -1,
            magic_defense: 0,
            attacks_per_round: 1,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MonsterFlags: u8 {
        /// Never flees and is immune to critical hits.
        const BOSS = 1 << 0;
        const UNDEAD = 1 << 1;
    }
}

/// Monster-only state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonsterTraits {
    /// 0..=100; halved by some battlefield events.
    pub morale: u32,
    pub flags: MonsterFlags,
    pub defeat_experience: u32,
}

/// Variant discriminant of a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatantKind {
    PartyMember,
    Monster(MonsterTraits),
}

/// Which side of the battle a combatant fights on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Party,
    Monsters,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Party => Self::Monsters,
            Self::Monsters => Self::Party,
        }
    }
}

/// A party member or a monster taking part in a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub name: String,
    pub kind: CombatantKind,
    pub level: u32,
    pub hit_points: ResourceMeter,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spell_points: ResourceMeter,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Abilities,
    #[cfg_attr(feature = "serde", serde(default))]
    pub combat: CombatValues,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ailments: Ailments,
    #[cfg_attr(feature = "serde", serde(default))]
    pub equipment: Equipment,
    #[cfg_attr(feature = "serde", serde(default))]
    pub inventory: Inventory,
    /// Spells this combatant can cast.
    #[cfg_attr(feature = "serde", serde(default))]
    pub spells: Vec<Spell>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spell_immunity: SpellSchools,
}

impl Combatant {
    fn base(name: impl Into<String>, kind: CombatantKind, level: u32, hit_points: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            level,
            hit_points: ResourceMeter::full(hit_points),
            spell_points: ResourceMeter::default(),
            attributes: Attributes::default(),
            abilities: Abilities::default(),
            combat: CombatValues::default(),
            ailments: Ailments::empty(),
            equipment: Equipment::new(),
            inventory: Inventory::new(),
            spells: Vec::new(),
            spell_immunity: SpellSchools::empty(),
        }
    }

    pub fn party_member(name: impl Into<String>, level: u32, hit_points: u32) -> Self {
        Self::base(name, CombatantKind::PartyMember, level, hit_points)
    }

    pub fn monster(
        name: impl Into<String>,
        level: u32,
        hit_points: u32,
        traits: MonsterTraits,
    ) -> Self {
        Self::base(name, CombatantKind::Monster(traits), level, hit_points)
    }

    pub fn side(&self) -> Side {
        match self.kind {
            CombatantKind::PartyMember => Side::Party,
            CombatantKind::Monster(_) => Side::Monsters,
        }
    }

    pub fn is_monster(&self) -> bool {
        matches!(self.kind, CombatantKind::Monster(_))
    }

    pub fn is_party_member(&self) -> bool {
        matches!(self.kind, CombatantKind::PartyMember)
    }

    pub fn monster_traits(&self) -> Option<&MonsterTraits> {
        match &self.kind {
            CombatantKind::Monster(traits) => Some(traits),
            CombatantKind::PartyMember => None,
        }
    }

    pub fn monster_traits_mut(&mut self) -> Option<&mut MonsterTraits> {
        match &mut self.kind {
            CombatantKind::Monster(traits) => Some(traits),
            CombatantKind::PartyMember => None,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.monster_traits()
            .is_some_and(|traits| traits.flags.contains(MonsterFlags::BOSS))
    }

    pub fn is_undead(&self) -> bool {
        self.monster_traits()
            .is_some_and(|traits| traits.flags.contains(MonsterFlags::UNDEAD))
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points.current > 0
    }

    pub fn speed(&self) -> u32 {
        self.attributes.speed
    }

    /// Applies damage; returns true when the combatant died from it.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive();
        self.hit_points.drain(amount);
        was_alive && !self.is_alive()
    }

    pub fn halve_morale(&mut self) {
        if let Some(traits) = self.monster_traits_mut() {
            traits.morale /= 2;
        }
    }

    /// Builder-style helpers used by hosts and tests.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_combat(mut self, combat: CombatValues) -> Self {
        self.combat = combat;
        self
    }

    pub fn with_ailments(mut self, ailments: Ailments) -> Self {
        self.ailments = ailments;
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_spells(mut self, spell_points: u32, spells: Vec<Spell>) -> Self {
        self.spell_points = ResourceMeter::full(spell_points);
        self.spells = spells;
        self
    }
}
