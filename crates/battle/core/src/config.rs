/// Battle configuration constants and tunable parameters.
///
/// Runtime-tunable values live in fields; balance constants of the game
/// data set are associated constants so the AI and combat rules read them by
/// name instead of repeating literals.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// When set, every action that shows a message waits for
    /// [`crate::Battle::submit_click`] before the next action is dequeued.
    pub needs_click_for_next_action: bool,
    /// Cosmetic delay (in host clock ticks) between a message and the
    /// completion of the step that produced it. Zero resolves inline.
    pub message_delay_ticks: u64,
}

impl BattleConfig {
    // ===== battlefield geometry =====
    pub const COLUMNS: usize = 6;
    pub const ROWS: usize = 5;
    pub const SLOTS: usize = Self::COLUMNS * Self::ROWS;
    /// First slot of the party zone; party members sit at `18 + position`.
    pub const PARTY_ZONE_START: usize = 18;
    /// Rows reachable by monsters (back row 0 through the shared row 3).
    pub const MONSTER_MAX_ROW: usize = 3;
    pub const PARTY_MIN_ROW: usize = 3;
    pub const MAX_PARTY_MEMBERS: usize = 6;
    pub const MAX_INVENTORY_SLOTS: usize = 24;

    // ===== monster action roll =====
    /// Upper bound (inclusive) of the 16-way action roll.
    pub const ACTION_ROLL_MAX: i32 = 15;
    /// Rolls below this try to cast a spell.
    pub const ACTION_ROLL_SPELL: i32 = 8;
    /// Rolls below this (and not below the spell bound) try a ranged attack.
    pub const ACTION_ROLL_RANGED: i32 = 14;
    /// Crazy combatants attack first when `random_int(0, 0xffff)` is below this.
    pub const MAD_ATTACK_FIRST_THRESHOLD: i32 = 40000;
    pub const MAD_ROLL_MAX: i32 = 0xffff;

    // ===== morale / flee =====
    pub const FEAR_LOW_HP_WEIGHT: u32 = 75;
    pub const FEAR_RDE_BASELINE: i32 = 50;
    pub const FEAR_RDE_DIVISOR: i32 = 4;
    pub const FEAR_ALLY_WEIGHT: i32 = 40;
    pub const FEAR_ALLY_OFFSET: i32 = 25;
    pub const RDE_SCALE: u32 = 50;
    pub const RDE_MAX: u32 = 100;
    pub const RDE_DAMAGE_CLAMP: u32 = 0x7fff;

    // ===== movement =====
    /// Speed divisor for the legal move range (clamped to 1..=3).
    pub const MOVE_RANGE_SPEED_DIVISOR: u32 = 40;
    pub const MAX_MOVE_RANGE: u32 = 3;
    /// Speed at which the best-move-spot search looks two squares ahead.
    pub const FAST_MOVER_SPEED: u32 = 80;
    /// Attack range of a loaded long-ranged weapon.
    pub const RANGED_ATTACK_RANGE: u32 = 6;
    /// Party members at or beyond this slot may flee when panicked.
    pub const PANIC_FLEE_SLOT: usize = 24;

    // ===== targeting =====
    pub const SPELL_PRIO_ALL_TARGETS: u32 = 75;
    pub const SPELL_PRIO_ROW_TARGETS: u32 = 50;

    // ===== rolls and damage =====
    /// Break chances are compared against `random_int(0, BREAK_ROLL_MAX)`.
    pub const BREAK_ROLL_MAX: i32 = 999;
    pub const POISON_DAMAGE_MIN: i32 = 1;
    pub const POISON_DAMAGE_MAX: i32 = 5;
    pub const STRENGTH_DAMAGE_DIVISOR: i32 = 25;
    pub const DAMAGE_ROLL_MIN: i32 = 50;
    pub const DAMAGE_ROLL_MAX: i32 = 100;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_NEEDS_CLICK: bool = false;
    pub const DEFAULT_MESSAGE_DELAY_TICKS: u64 = 0;

    pub fn new() -> Self {
        Self {
            needs_click_for_next_action: Self::DEFAULT_NEEDS_CLICK,
            message_delay_ticks: Self::DEFAULT_MESSAGE_DELAY_TICKS,
        }
    }

    pub fn with_click_gate(mut self, needs_click: bool) -> Self {
        self.needs_click_for_next_action = needs_click;
        self
    }

    pub fn with_message_delay(mut self, ticks: u64) -> Self {
        self.message_delay_ticks = ticks;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
