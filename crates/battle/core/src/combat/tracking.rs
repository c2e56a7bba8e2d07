/// Running damage statistics of one combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitStats {
    pub total: u32,
    pub hits: u32,
    pub average: u32,
}

impl HitStats {
    pub fn record(&mut self, damage: u32) {
        if damage == 0 {
            return;
        }
        self.total = self.total.saturating_add(damage);
        self.hits += 1;
        self.average = self.total / self.hits;
    }
}

/// Per-combatant damage accumulators kept for the whole battle.
///
/// Indexed by arena id, so both party members and the initial monster
/// group are covered.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    stats: Vec<HitStats>,
}

impl DamageTracker {
    pub fn new(combatants: usize) -> Self {
        Self {
            stats: vec![HitStats::default(); combatants],
        }
    }

    pub fn record(&mut self, combatant: crate::state::CombatantId, damage: u32) {
        if let Some(stats) = self.stats.get_mut(combatant.index()) {
            stats.record(damage);
        }
    }

    pub fn stats(&self, combatant: crate::state::CombatantId) -> HitStats {
        self.stats
            .get(combatant.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn average(&self, combatant: crate::state::CombatantId) -> u32 {
        self.stats(combatant).average
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CombatantId;

    #[test]
    fn zero_damage_is_not_a_hit() {
        let mut tracker = DamageTracker::new(2);
        tracker.record(CombatantId(1), 0);
        assert_eq!(tracker.stats(CombatantId(1)), HitStats::default());
    }

    #[test]
    fn average_uses_integer_division() {
        let mut tracker = DamageTracker::new(1);
        tracker.record(CombatantId(0), 10);
        tracker.record(CombatantId(0), 5);
        assert_eq!(
            tracker.stats(CombatantId(0)),
            HitStats {
                total: 15,
                hits: 2,
                average: 7
            }
        );
        assert_eq!(tracker.average(CombatantId(9)), 0);
    }
}
