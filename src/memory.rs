use std::collections::{BTreeMap, VecDeque};

use crate::process::FutureReferences;
use crate::replacement::ReplacementPolicy;

/// How frames are shared between processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationPolicy {
    /// Each process owns a bounded set of frames
    Local,
    /// One bounded set shared by every process
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// A resident page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub page: u32,
    pub owner: String,
    pub referenced: bool,
    pub modified: bool,
    /// Virtual time of the last hit (or of the load)
    pub last_access: u64,
}

impl Frame {
    /// A freshly loaded page: both bits clear
    pub fn new(owner: &str, page: u32, now: u64) -> Self {
        Frame {
            page,
            owner: owner.to_string(),
            referenced: false,
            modified: false,
            last_access: now,
        }
    }

    #[inline]
    fn holds(&self, owner: &str, page: u32) -> bool {
        self.page == page && self.owner == owner
    }
}

/// A bounded list of frames plus its insertion order
#[derive(Debug, Clone)]
pub struct FrameScope {
    frames: Vec<Frame>,
    capacity: usize,
    /// Slots in the order their current page was loaded
    arrivals: VecDeque<usize>,
}

impl FrameScope {
    pub fn new(capacity: usize) -> Self {
        FrameScope {
            frames: Vec::with_capacity(capacity),
            capacity,
            arrivals: VecDeque::with_capacity(capacity),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    /// Slot holding the oldest still-resident load
    pub fn oldest_slot(&self) -> Option<usize> {
        self.arrivals.front().copied()
    }

    pub fn find(&self, owner: &str, page: u32) -> Option<usize> {
        self.frames.iter().position(|f| f.holds(owner, page))
    }

    /// Append a frame into a free slot
    pub fn push(&mut self, frame: Frame) {
        debug_assert!(!self.is_full(), "push into a full scope");
        debug_assert!(self.find(&frame.owner, frame.page).is_none());
        self.arrivals.push_back(self.frames.len());
        self.frames.push(frame);
    }

    /// Overwrite `slot` in place and return the evicted frame
    pub fn replace(&mut self, slot: usize, frame: Frame) -> Frame {
        if let Some(pos) = self.arrivals.iter().position(|&s| s == slot) {
            self.arrivals.remove(pos);
        }
        self.arrivals.push_back(slot);
        std::mem::replace(&mut self.frames[slot], frame)
    }
}

/// All resident frames of the machine, plus the fault counter
#[derive(Debug)]
pub struct FrameTable {
    allocation: AllocationPolicy,
    local_capacity: usize,
    local: BTreeMap<String, FrameScope>,
    global: FrameScope,
    policy: Box<dyn ReplacementPolicy>,
    faults: u64,
}

impl FrameTable {
    pub fn new(
        allocation: AllocationPolicy,
        local_capacity: usize,
        total_capacity: usize,
        policy: Box<dyn ReplacementPolicy>,
    ) -> Self {
        FrameTable {
            allocation,
            local_capacity,
            local: BTreeMap::new(),
            global: FrameScope::new(total_capacity),
            policy,
            faults: 0,
        }
    }

    /// Touch `page` on behalf of `owner`.
    ///
    /// Returns `true` on a hit. On a miss the fault is counted, the page is
    /// loaded (evicting a victim if the scope is full) and `false` is
    /// returned: the page is resident either way, but the caller owes the
    /// load delay.
    pub fn access_page(
        &mut self,
        owner: &str,
        page: u32,
        kind: AccessKind,
        now: u64,
        future: &dyn FutureReferences,
    ) -> bool {
        let scope = match self.allocation {
            AllocationPolicy::Local => {
                let capacity = self.local_capacity;
                self.local
                    .entry(owner.to_string())
                    .or_insert_with(|| FrameScope::new(capacity))
            }
            AllocationPolicy::Global => &mut self.global,
        };

        if let Some(slot) = scope.find(owner, page) {
            let frame = &mut scope.frames[slot];
            frame.referenced = true;
            frame.last_access = now;
            if kind == AccessKind::Write {
                frame.modified = true;
            }
            return true;
        }

        self.faults += 1;
        let frame = Frame::new(owner, page, now);

        if !scope.is_full() {
            scope.push(frame);
            return false;
        }

        let slot = self.policy.select_victim(scope, future);
        let evicted = scope.replace(slot, frame);
        log::debug!(
            "{}: evicted page {} of {} for page {} of {}",
            self.policy.name(),
            evicted.page,
            evicted.owner,
            page,
            owner
        );
        false
    }

    /// Complete a write whose page load has finished: dirty the frame if it
    /// is still resident. Never faults. Returns whether the frame was found.
    pub fn mark_written(&mut self, owner: &str, page: u32, now: u64) -> bool {
        let scope = match self.allocation {
            AllocationPolicy::Local => self.local.get_mut(owner),
            AllocationPolicy::Global => Some(&mut self.global),
        };
        let Some(scope) = scope else {
            return false;
        };
        match scope.find(owner, page) {
            Some(slot) => {
                let frame = &mut scope.frames[slot];
                frame.referenced = true;
                frame.modified = true;
                frame.last_access = now;
                true
            }
            None => false,
        }
    }

    pub fn is_resident(&self, owner: &str, page: u32) -> bool {
        self.scope_of(owner)
            .is_some_and(|scope| scope.find(owner, page).is_some())
    }

    /// Frames currently held by `owner`, whatever the allocation policy
    pub fn resident_count(&self, owner: &str) -> usize {
        self.scope_of(owner)
            .map_or(0, |scope| scope.frames().iter().filter(|f| f.owner == owner).count())
    }

    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    pub fn allocation(&self) -> AllocationPolicy {
        self.allocation
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Per-process scopes, ordered by process id (empty under global allocation)
    pub fn local_scopes(&self) -> impl Iterator<Item = (&str, &FrameScope)> {
        self.local.iter().map(|(id, scope)| (id.as_str(), scope))
    }

    pub fn global_scope(&self) -> &FrameScope {
        &self.global
    }

    fn scope_of(&self, owner: &str) -> Option<&FrameScope> {
        match self.allocation {
            AllocationPolicy::Local => self.local.get(owner),
            AllocationPolicy::Global => Some(&self.global),
        }
    }
}
