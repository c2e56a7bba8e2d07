use crate::env::Spell;
use crate::state::ItemId;

/// Read-only item catalog consulted for weapon classes, ammunition and
/// breakage chances.
pub trait ItemOracle: Send + Sync {
    fn definition(&self, id: ItemId) -> Option<&ItemDefinition>;
}

/// Static description of an item as far as battles are concerned.
///
/// Damage and defense values are already folded into each combatant's base
/// values by the host, so the catalog only carries what changes the flow of
/// a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Break chance in per mille, compared against `random_int(0, 999)`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub break_chance: u16,
    /// Number of hands a weapon occupies.
    #[cfg_attr(feature = "serde", serde(default = "one_hand"))]
    pub hands: u8,
    /// For long-ranged weapons the ammunition they fire, for ammunition the
    /// type it provides.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ammunition: Option<AmmunitionType>,
    /// Spell stored in the item, castable while it has charges.
    #[cfg_attr(feature = "serde", serde(default))]
    pub spell: Option<Spell>,
}

#[cfg(feature = "serde")]
fn one_hand() -> u8 {
    1
}

impl ItemDefinition {
    pub fn new(id: ItemId, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            break_chance: 0,
            hands: 1,
            ammunition: None,
            spell: None,
        }
    }

    pub fn with_break_chance(mut self, per_mille: u16) -> Self {
        self.break_chance = per_mille;
        self
    }

    pub fn with_hands(mut self, hands: u8) -> Self {
        self.hands = hands;
        self
    }

    pub fn with_ammunition(mut self, ammunition: AmmunitionType) -> Self {
        self.ammunition = Some(ammunition);
        self
    }

    pub fn with_spell(mut self, spell: Spell) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn is_long_ranged(&self) -> bool {
        self.kind == ItemKind::LongRangeWeapon
    }

    pub fn is_two_handed(&self) -> bool {
        self.hands >= 2
    }

    /// Ammunition a long-ranged weapon needs, `None` for weapons that fire
    /// without it.
    pub fn required_ammunition(&self) -> Option<AmmunitionType> {
        if self.is_long_ranged() {
            self.ammunition
        } else {
            None
        }
    }

    /// Whether this item is ammunition of the given type.
    pub fn provides_ammunition(&self, kind: AmmunitionType) -> bool {
        self.kind == ItemKind::Ammunition && self.ammunition == Some(kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    CloseRangeWeapon,
    LongRangeWeapon,
    Ammunition,
    Armor,
    Shield,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmmunitionType {
    Arrow,
    Bolt,
    SlingStone,
    SlingDagger,
}
