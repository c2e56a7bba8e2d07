//! The per-round action queue.

use std::collections::VecDeque;

use crate::action::BattleActionKind;
use crate::state::CombatantId;

/// One scheduled step of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedAction {
    pub actor: CombatantId,
    pub kind: BattleActionKind,
    pub param: u32,
    /// Skipped entries are dropped by the drain without executing.
    pub skip: bool,
}

/// FIFO of queued actions with the skip operations the rules need.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    entries: VecDeque<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actor: CombatantId, kind: BattleActionKind, param: u32, skip: bool) {
        self.entries.push_back(QueuedAction {
            actor,
            kind,
            param,
            skip,
        });
    }

    pub fn pop(&mut self) -> Option<QueuedAction> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<&QueuedAction> {
        self.entries.front()
    }

    /// Overwrites the parameter of the next entry. Returns false when the
    /// queue is empty.
    pub fn set_next_param(&mut self, param: u32) -> bool {
        match self.entries.front_mut() {
            Some(next) => {
                next.param = param;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.entries.iter()
    }

    /// Skips the rest of the actor's current chain: every entry of `actor`
    /// up to, not including, its next DisplayActionText.
    pub fn skip_current_chain(&mut self, actor: CombatantId) {
        for entry in self.entries.iter_mut().filter(|e| e.actor == actor) {
            if entry.kind == BattleActionKind::DisplayActionText {
                break;
            }
            entry.skip = true;
        }
    }

    /// Skips the actor's later turns: from its next DisplayActionText on.
    pub fn skip_following_turns(&mut self, actor: CombatantId) {
        let mut reached = false;
        for entry in self.entries.iter_mut().filter(|e| e.actor == actor) {
            reached |= entry.kind == BattleActionKind::DisplayActionText;
            if reached {
                entry.skip = true;
            }
        }
    }

    /// Skips every remaining entry of the actor.
    pub fn skip_actor(&mut self, actor: CombatantId) {
        for entry in self.entries.iter_mut().filter(|e| e.actor == actor) {
            entry.skip = true;
        }
    }

    /// Clears the skip flag on every remaining entry of the actor.
    pub fn unskip_actor(&mut self, actor: CombatantId) {
        for entry in self.entries.iter_mut().filter(|e| e.actor == actor) {
            entry.skip = false;
        }
    }

    /// Skips the actor's entries whose kind matches the predicate.
    pub fn skip_actor_where(
        &mut self,
        actor: CombatantId,
        mut predicate: impl FnMut(BattleActionKind) -> bool,
    ) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.actor == actor && predicate(e.kind))
        {
            entry.skip = true;
        }
    }

    pub fn has_pending(&self, actor: CombatantId, kind: BattleActionKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.actor == actor && e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BattleActionKind::*;

    const HERO: CombatantId = CombatantId(0);
    const ORC: CombatantId = CombatantId(1);

    fn two_turn_queue() -> ActionQueue {
        let mut queue = ActionQueue::new();
        for _ in 0..2 {
            queue.push(HERO, DisplayActionText, 0, false);
            queue.push(HERO, Attack, 0, false);
            for kind in BattleActionKind::ATTACK_CHAIN {
                queue.push(HERO, kind, 0, false);
            }
        }
        queue.push(ORC, DisplayActionText, 0, false);
        queue.push(ORC, Flee, 0, false);
        queue
    }

    fn skipped(queue: &ActionQueue) -> Vec<bool> {
        queue.iter().map(|e| e.skip).collect()
    }

    #[test]
    fn aborting_a_chain_stops_at_the_next_display_text() {
        let mut queue = two_turn_queue();
        queue.pop();
        queue.pop();
        queue.skip_current_chain(HERO);

        let flags = skipped(&queue);
        assert!(flags[..6].iter().all(|&s| s));
        assert!(flags[6..].iter().all(|&s| !s));
    }

    #[test]
    fn following_turns_start_at_the_next_display_text() {
        let mut queue = two_turn_queue();
        queue.pop();
        queue.pop();
        queue.skip_following_turns(HERO);

        let flags = skipped(&queue);
        assert!(flags[..6].iter().all(|&s| !s));
        assert!(flags[6..14].iter().all(|&s| s));
        assert!(!flags[14] && !flags[15]);
    }

    #[test]
    fn set_next_param_writes_only_the_front_entry() {
        let mut queue = two_turn_queue();
        assert!(queue.set_next_param(77));
        assert_eq!(queue.peek().map(|e| e.param), Some(77));
        assert!(queue.iter().skip(1).all(|e| e.param == 0));

        let mut empty = ActionQueue::new();
        assert!(!empty.set_next_param(1));
    }

    #[test]
    fn unskip_restores_hurried_attacks() {
        let mut queue = two_turn_queue();
        queue.skip_actor(HERO);
        assert!(queue.iter().filter(|e| e.actor == HERO).all(|e| e.skip));
        queue.unskip_actor(HERO);
        assert!(queue.iter().all(|e| !e.skip));
    }
}
