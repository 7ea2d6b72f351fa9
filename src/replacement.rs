//! Victim selection for a full frame scope.
//!
//! Every policy only ever looks at the scope it is handed: under local
//! allocation that is the faulting process's own frames, under global
//! allocation the machine-wide table.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::memory::FrameScope;
use crate::process::FutureReferences;

/// Picks the slot to overwrite when a scope is full
pub trait ReplacementPolicy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Return the index (table order) of the victim frame in `scope`.
    /// The scope is never empty when this is called.
    fn select_victim(&mut self, scope: &mut FrameScope, future: &dyn FutureReferences) -> usize;
}

/// Replacement algorithm named in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Fifo,
    Nru,
    SecondChance,
    Optimal,
}

impl Algorithm {
    pub fn build(self) -> Box<dyn ReplacementPolicy> {
        match self {
            Algorithm::Fifo => Box::new(Fifo),
            Algorithm::Nru => Box::new(Nru),
            Algorithm::SecondChance => Box::new(SecondChance),
            Algorithm::Optimal => Box::new(Optimal),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FIFO" => Ok(Algorithm::Fifo),
            "NRU" => Ok(Algorithm::Nru),
            "SECONDE_CHANCE" | "SECOND_CHANCE" => Ok(Algorithm::SecondChance),
            "OPTIMAL" => Ok(Algorithm::Optimal),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Evicts the oldest insertion still resident in the scope
#[derive(Debug, Default)]
pub struct Fifo;

impl ReplacementPolicy for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn select_victim(&mut self, scope: &mut FrameScope, _future: &dyn FutureReferences) -> usize {
        debug_assert!(scope.oldest_slot().is_some(), "FIFO queue out of sync with frames");
        scope.oldest_slot().unwrap_or(0)
    }
}

/// Not Recently Used.
///
/// Frames are ranked by (referenced, modified):
/// (0,0) < (0,1) < (1,0) < (1,1). The first frame in table order of the
/// lowest non-empty class goes. Bits are classified as they stand at the
/// fault; nothing clears them in the background.
#[derive(Debug, Default)]
pub struct Nru;

impl Nru {
    #[inline]
    fn class(referenced: bool, modified: bool) -> u8 {
        (u8::from(referenced) << 1) | u8::from(modified)
    }
}

impl ReplacementPolicy for Nru {
    fn name(&self) -> &'static str {
        "NRU"
    }

    fn select_victim(&mut self, scope: &mut FrameScope, _future: &dyn FutureReferences) -> usize {
        // min_by_key keeps the first of equal keys, i.e. table order
        scope
            .frames()
            .iter()
            .enumerate()
            .min_by_key(|(_, frame)| Nru::class(frame.referenced, frame.modified))
            .map(|(slot, _)| slot)
            .unwrap_or(0)
    }
}

/// Second chance, scanning from the start of the table on every fault
#[derive(Debug, Default)]
pub struct SecondChance;

impl ReplacementPolicy for SecondChance {
    fn name(&self) -> &'static str {
        "SECONDE_CHANCE"
    }

    fn select_victim(&mut self, scope: &mut FrameScope, _future: &dyn FutureReferences) -> usize {
        let frames = scope.frames_mut();
        let len = frames.len();
        // first pass clears every bit it passes, so the second one must stop
        for step in 0..2 * len {
            let slot = step % len;
            if !frames[slot].referenced {
                return slot;
            }
            frames[slot].referenced = false;
        }
        0
    }
}

/// Belady's furthest-next-use policy.
///
/// Looks ahead into each owner's remaining events. A frame whose page is
/// never touched again wins outright; otherwise the one used furthest in
/// the future goes. Ties fall to table order, so with no lookahead at all
/// this degenerates to evicting the first frame.
#[derive(Debug, Default)]
pub struct Optimal;

impl ReplacementPolicy for Optimal {
    fn name(&self) -> &'static str {
        "OPTIMAL"
    }

    fn select_victim(&mut self, scope: &mut FrameScope, future: &dyn FutureReferences) -> usize {
        let mut victim = 0;
        let mut furthest = 0;

        for (slot, frame) in scope.frames().iter().enumerate() {
            match future.next_use(&frame.owner, frame.page) {
                None => return slot,
                Some(distance) if slot == 0 || distance > furthest => {
                    victim = slot;
                    furthest = distance;
                }
                Some(_) => {}
            }
        }
        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Frame;
    use crate::process::{Event, NoLookahead, Process};

    fn scope_with(bits: &[(u32, bool, bool)]) -> FrameScope {
        let mut scope = FrameScope::new(bits.len());
        for &(page, referenced, modified) in bits {
            let mut frame = Frame::new("P1", page, 0);
            frame.referenced = referenced;
            frame.modified = modified;
            scope.push(frame);
        }
        scope
    }

    #[test]
    fn test_algorithm_names_are_case_insensitive() {
        assert_eq!("fifo".parse::<Algorithm>().unwrap(), Algorithm::Fifo);
        assert_eq!("Nru".parse::<Algorithm>().unwrap(), Algorithm::Nru);
        assert_eq!("seconde_chance".parse::<Algorithm>().unwrap(), Algorithm::SecondChance);
        assert_eq!("SECOND_CHANCE".parse::<Algorithm>().unwrap(), Algorithm::SecondChance);
        assert_eq!(" optimal ".parse::<Algorithm>().unwrap(), Algorithm::Optimal);
        assert!(matches!(
            "LRU".parse::<Algorithm>(),
            Err(ConfigError::UnknownAlgorithm(name)) if name == "LRU"
        ));
    }

    #[test]
    fn test_build_returns_matching_policy() {
        assert_eq!(Algorithm::Fifo.build().name(), "FIFO");
        assert_eq!(Algorithm::Nru.build().name(), "NRU");
        assert_eq!(Algorithm::SecondChance.build().name(), "SECONDE_CHANCE");
        assert_eq!(Algorithm::Optimal.build().name(), "OPTIMAL");
    }

    #[test]
    fn test_fifo_picks_oldest_insertion() {
        let mut scope = scope_with(&[(1, true, true), (2, false, false), (3, false, false)]);
        assert_eq!(Fifo.select_victim(&mut scope, &NoLookahead), 0);

        // slot 0 is rewritten, so it moves to the back of the queue
        scope.replace(0, Frame::new("P1", 9, 1));
        assert_eq!(Fifo.select_victim(&mut scope, &NoLookahead), 1);
    }

    #[test]
    fn test_nru_class_order() {
        let mut scope = scope_with(&[(1, true, true), (2, true, false), (3, false, true), (4, false, false)]);
        assert_eq!(Nru.select_victim(&mut scope, &NoLookahead), 3);

        let mut scope = scope_with(&[(1, true, true), (2, true, false), (3, false, true)]);
        assert_eq!(Nru.select_victim(&mut scope, &NoLookahead), 2);

        let mut scope = scope_with(&[(1, true, true), (2, true, false)]);
        assert_eq!(Nru.select_victim(&mut scope, &NoLookahead), 1);

        let mut scope = scope_with(&[(1, true, true), (2, true, true)]);
        assert_eq!(Nru.select_victim(&mut scope, &NoLookahead), 0);
    }

    #[test]
    fn test_nru_first_in_table_order_within_class() {
        let mut scope = scope_with(&[(1, true, false), (2, false, true), (3, false, true)]);
        assert_eq!(Nru.select_victim(&mut scope, &NoLookahead), 1);
    }

    #[test]
    fn test_nru_leaves_bits_alone() {
        let mut scope = scope_with(&[(1, true, false), (2, true, true)]);
        Nru.select_victim(&mut scope, &NoLookahead);
        assert!(scope.frames().iter().all(|f| f.referenced));
    }

    #[test]
    fn test_second_chance_skips_referenced() {
        let mut scope = scope_with(&[(1, true, false), (2, false, false), (3, true, false)]);
        assert_eq!(SecondChance.select_victim(&mut scope, &NoLookahead), 1);
        // only the frame ahead of the victim lost its bit
        assert!(!scope.frames()[0].referenced);
        assert!(scope.frames()[2].referenced);
    }

    #[test]
    fn test_second_chance_all_referenced() {
        let mut scope = scope_with(&[(1, true, false), (2, true, true), (3, true, false)]);
        assert_eq!(SecondChance.select_victim(&mut scope, &NoLookahead), 0);
        assert!(scope.frames().iter().all(|f| !f.referenced));
    }

    #[test]
    fn test_second_chance_single_frame() {
        let mut scope = scope_with(&[(1, true, false)]);
        assert_eq!(SecondChance.select_victim(&mut scope, &NoLookahead), 0);
    }

    #[test]
    fn test_optimal_without_lookahead_takes_first() {
        let mut scope = scope_with(&[(1, false, false), (2, false, false)]);
        assert_eq!(Optimal.select_victim(&mut scope, &NoLookahead), 0);
    }

    #[test]
    fn test_optimal_prefers_page_never_used_again() {
        let procs = vec![Process::new(
            "P1",
            0,
            0,
            vec![Event::Read(1), Event::Read(3), Event::Read(2), Event::Terminate],
        )];
        let mut scope = scope_with(&[(1, false, false), (2, false, false), (3, false, false), (4, false, false)]);
        assert_eq!(Optimal.select_victim(&mut scope, &procs), 3);
    }

    #[test]
    fn test_optimal_picks_furthest_next_use() {
        let procs = vec![Process::new(
            "P1",
            0,
            0,
            vec![Event::Read(2), Event::Compute(5), Event::Write(3), Event::Read(1)],
        )];
        let mut scope = scope_with(&[(1, false, false), (2, false, false), (3, false, false)]);
        assert_eq!(Optimal.select_victim(&mut scope, &procs), 0);
    }
}
