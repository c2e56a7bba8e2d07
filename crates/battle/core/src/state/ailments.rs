use bitflags::bitflags;

bitflags! {
    /// Status conditions of a combatant.
    ///
    /// Each ailment withdraws one or more capabilities; the capability
    /// queries below are the only place the gating table is spelled out.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Ailments: u16 {
        const IRRITATED = 1 << 0;
        const CRAZY = 1 << 1;
        const BLIND = 1 << 2;
        const DRUGGED = 1 << 3;
        const LAMED = 1 << 4;
        const POISONED = 1 << 5;
        const PETRIFIED = 1 << 6;
        const DISEASED = 1 << 7;
        const AGING = 1 << 8;
        const SLEEP = 1 << 9;
        const PANIC = 1 << 10;
    }
}

impl Ailments {
    const BLOCKS_SELECT: Self = Self::SLEEP
        .union(Self::PANIC)
        .union(Self::CRAZY)
        .union(Self::PETRIFIED);
    const BLOCKS_MOVE: Self = Self::SLEEP.union(Self::PETRIFIED).union(Self::LAMED);
    const BLOCKS_ATTACK: Self = Self::SLEEP.union(Self::PETRIFIED).union(Self::PANIC);
    const BLOCKS_CAST: Self = Self::SLEEP
        .union(Self::PETRIFIED)
        .union(Self::PANIC)
        .union(Self::CRAZY)
        .union(Self::IRRITATED);
    const BLOCKS_FLEE: Self = Self::SLEEP.union(Self::PETRIFIED).union(Self::LAMED);
    const BLOCKS_PARRY: Self = Self::SLEEP
        .union(Self::PETRIFIED)
        .union(Self::PANIC)
        .union(Self::CRAZY)
        .union(Self::LAMED);
    const BLOCKS_FIGHT: Self = Self::SLEEP.union(Self::PETRIFIED);

    /// Whether the player may choose actions for this combatant.
    pub const fn can_select(self) -> bool {
        !self.intersects(Self::BLOCKS_SELECT)
    }

    pub const fn can_move(self) -> bool {
        !self.intersects(Self::BLOCKS_MOVE)
    }

    pub const fn can_attack(self) -> bool {
        !self.intersects(Self::BLOCKS_ATTACK)
    }

    pub const fn can_cast_spell(self) -> bool {
        !self.intersects(Self::BLOCKS_CAST)
    }

    pub const fn can_flee(self) -> bool {
        !self.intersects(Self::BLOCKS_FLEE)
    }

    pub const fn can_parry(self) -> bool {
        !self.intersects(Self::BLOCKS_PARRY)
    }

    /// Whether a party member still counts towards keeping the battle going.
    pub const fn can_fight(self) -> bool {
        !self.intersects(Self::BLOCKS_FIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_combatant_has_every_capability() {
        let none = Ailments::empty();
        assert!(none.can_select());
        assert!(none.can_move());
        assert!(none.can_attack());
        assert!(none.can_cast_spell());
        assert!(none.can_flee());
        assert!(none.can_parry());
        assert!(none.can_fight());
    }

    #[test]
    fn panic_still_allows_running_away() {
        let panic = Ailments::PANIC;
        assert!(!panic.can_select());
        assert!(!panic.can_attack());
        assert!(panic.can_move());
        assert!(panic.can_flee());
    }

    #[test]
    fn madness_allows_attacking_but_not_casting() {
        let crazy = Ailments::CRAZY;
        assert!(crazy.can_attack());
        assert!(crazy.can_move());
        assert!(!crazy.can_cast_spell());
        assert!(!crazy.can_parry());
    }

    #[test]
    fn petrified_combatant_is_frozen() {
        let stone = Ailments::PETRIFIED | Ailments::POISONED;
        assert!(!stone.can_move());
        assert!(!stone.can_attack());
        assert!(!stone.can_flee());
        assert!(!stone.can_fight());
    }
}
