//! Non-preemptive FCFS event loop.
//!
//! The virtual clock jumps from one meaningful instant to the next: an
//! arrival, an unblock, the end of a compute burst, a clock-interrupt
//! boundary or the horizon. Nothing ever waits on real time.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::memory::{AccessKind, FrameTable};
use crate::process::{Event, Process, ProcessState};
use crate::stats::{FrameSnapshot, Report, Statistics};

/// One line of the chronological trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLine {
    /// CPU busy with `process` over `[start, end)`
    Busy { start: u64, end: u64, process: String },
    Idle { start: u64, end: u64 },
    PageFault { at: u64, process: String, kind: AccessKind, until: u64 },
    DiskWrite { at: u64, process: String, until: u64 },
    Sleep { at: u64, process: String, until: u64 },
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceLine::Busy { start, end, process } => write!(f, "{} - {} : Process {}", start, end, process),
            TraceLine::Idle { start, end } => write!(f, "{} - {} : Inactivity", start, end),
            TraceLine::PageFault { at, process, kind, until } => {
                let kind = match kind {
                    AccessKind::Read => "READ",
                    AccessKind::Write => "WRITE",
                };
                write!(f, "{} : Page fault ({}) - Process {} blocked until {}", at, kind, process, until)
            }
            TraceLine::DiskWrite { at, process, until } => {
                write!(f, "{} : Disk write - Process {} blocked until {}", at, process, until)
            }
            TraceLine::Sleep { at, process, until } => {
                write!(f, "{} : Sleep - Process {} blocked until {}", at, process, until)
            }
        }
    }
}

/// Whole simulation state: processes, queues, memory and clock
#[derive(Debug)]
pub struct Simulator {
    config: SimConfig,
    /// Sorted by arrival; indices into this vec identify processes
    processes: Vec<Process>,
    /// Position of each process in the input, parallel to `processes`
    input_order: Vec<usize>,
    frames: FrameTable,
    stats: Statistics,
    clock: u64,
    next_arrival: usize,
    ready: VecDeque<usize>,
    /// (unblock time, input position, process)
    blocked: BinaryHeap<Reverse<(u64, usize, usize)>>,
    running: Option<usize>,
    /// Lines produced by the current step, not yet handed out
    pending: Vec<TraceLine>,
    /// Full trace, only kept by `run`
    trace: Vec<TraceLine>,
}

impl Simulator {
    /// Set up a run. Fails if the configured strategy is not FCFS.
    pub fn new(config: SimConfig, processes: Vec<Process>) -> SimResult<Self> {
        config.check_scheduling()?;
        let mut indexed: Vec<(usize, Process)> = processes.into_iter().enumerate().collect();
        indexed.sort_by_key(|(_, p)| p.arrival);
        let (input_order, processes): (Vec<usize>, Vec<Process>) = indexed.into_iter().unzip();
        let frames = config.frame_table();

        Ok(Simulator {
            config,
            processes,
            input_order,
            frames,
            stats: Statistics::new(),
            clock: 0,
            next_arrival: 0,
            ready: VecDeque::new(),
            blocked: BinaryHeap::new(),
            running: None,
            pending: Vec::new(),
            trace: Vec::new(),
        })
    }

    /// Run to the horizon and return the trace
    pub fn run(&mut self) -> &[TraceLine] {
        let mut lines = Vec::new();
        self.drive(|line| lines.push(line));
        self.trace.extend(lines);
        &self.trace
    }

    /// Run to the horizon, handing each trace line to `on_line` as soon as
    /// it is produced. Lines are not retained.
    pub fn run_with<F: FnMut(&TraceLine)>(&mut self, mut on_line: F) {
        self.drive(|line| on_line(&line));
    }

    fn drive<F: FnMut(TraceLine)>(&mut self, mut sink: F) {
        while self.clock < self.config.horizon {
            self.admit_until(self.clock);
            match self.running {
                Some(idx) => self.execute(idx),
                None => {
                    if !self.dispatch() {
                        self.idle();
                    }
                }
            }

            for line in self.pending.drain(..) {
                sink(line);
            }
        }
    }

    /// Move every arrival and unblock due at or before `t` to the Ready
    /// queue, in time order. Arrivals go first on ties, then input order.
    fn admit_until(&mut self, t: u64) {
        loop {
            let arrival = self
                .processes
                .get(self.next_arrival)
                .map(|p| p.arrival)
                .filter(|&at| at <= t);
            let unblock = self
                .blocked
                .peek()
                .map(|Reverse((until, _, _))| *until)
                .filter(|&until| until <= t);

            let idx = match (arrival, unblock) {
                (Some(a), Some(u)) if u < a => self.pop_blocked(),
                (Some(_), _) => {
                    let idx = self.next_arrival;
                    self.next_arrival += 1;
                    log::debug!("t={}: {} arrives", self.clock, self.processes[idx].id);
                    idx
                }
                (None, Some(_)) => self.pop_blocked(),
                (None, None) => break,
            };

            self.processes[idx].state = ProcessState::Ready;
            self.ready.push_back(idx);
        }
    }

    fn pop_blocked(&mut self) -> usize {
        match self.blocked.pop() {
            Some(Reverse((until, _, idx))) => {
                log::debug!("t={}: {} unblocked (due {})", self.clock, self.processes[idx].id, until);
                idx
            }
            None => unreachable!("pop_blocked called on an empty queue"),
        }
    }

    /// Earliest instant something can change while the CPU is idle
    fn next_instant(&self) -> u64 {
        let arrival = self.processes.get(self.next_arrival).map(|p| p.arrival);
        let unblock = self.blocked.peek().map(|Reverse((until, _, _))| *until);
        [arrival, unblock]
            .into_iter()
            .flatten()
            .fold(self.config.horizon, u64::min)
    }

    /// Hand the CPU to the head of the Ready queue, waiting for the next
    /// clock-interrupt boundary first. Returns false if nobody is ready.
    fn dispatch(&mut self) -> bool {
        let Some(idx) = self.ready.pop_front() else {
            return false;
        };

        let tick = self.config.clock_tick;
        if tick > 0 && self.clock % tick != 0 {
            let boundary = (self.clock / tick + 1)
                .checked_mul(tick)
                .map_or(self.config.horizon, |b| b.min(self.config.horizon));
            self.idle_until(boundary);
        }
        if self.clock >= self.config.horizon {
            self.ready.push_front(idx);
            return true;
        }

        let process = &mut self.processes[idx];
        process.state = ProcessState::Running;
        process.first_dispatch.get_or_insert(self.clock);
        log::debug!("t={}: dispatch {}", self.clock, process.id);
        self.running = Some(idx);
        true
    }

    fn idle(&mut self) {
        let next = self.next_instant().max(self.clock + 1);
        self.idle_until(next);
    }

    fn idle_until(&mut self, until: u64) {
        if until > self.clock {
            self.pending.push(TraceLine::Idle { start: self.clock, end: until });
            self.clock = until;
        }
    }

    /// Carry out the running process's current event
    fn execute(&mut self, idx: usize) {
        let Some(event) = self.processes[idx].current_event() else {
            log::warn!("{} ran out of events without FIN, retiring it", self.processes[idx].id);
            self.processes[idx].state = ProcessState::Terminated { at: self.clock };
            self.running = None;
            return;
        };
        let now = self.clock;

        match event {
            Event::Compute(duration) => {
                let end = now.saturating_add(duration);
                let stop = end.min(self.config.horizon);
                if stop > now {
                    self.pending.push(TraceLine::Busy {
                        start: now,
                        end: stop,
                        process: self.processes[idx].id.clone(),
                    });
                }
                self.clock = stop;
                // a burst cut by the horizon is never completed
                if end <= self.config.horizon {
                    self.processes[idx].advance();
                }
            }
            Event::Read(page) => {
                let hit = self.touch(idx, page, AccessKind::Read);
                self.processes[idx].advance();
                if !hit {
                    let until = now.saturating_add(self.config.page_load_time);
                    self.pending.push(TraceLine::PageFault {
                        at: now,
                        process: self.processes[idx].id.clone(),
                        kind: AccessKind::Read,
                        until,
                    });
                    self.block(idx, until);
                }
            }
            Event::Write(page) => {
                let loaded = self.processes[idx].loaded_write.take() == Some(page);
                let until;
                // a completed load services the write, evicted since or not
                if loaded {
                    let owner = &self.processes[idx].id;
                    if !self.frames.mark_written(owner, page, now) {
                        log::debug!("t={}: page {} of {} evicted before its write", now, page, owner);
                    }
                }
                if loaded || self.touch(idx, page, AccessKind::Write) {
                    // written through to disk on every hit
                    until = now.saturating_add(self.config.disk_write_time);
                    self.processes[idx].advance();
                    self.pending.push(TraceLine::DiskWrite {
                        at: now,
                        process: self.processes[idx].id.clone(),
                        until,
                    });
                } else {
                    until = now.saturating_add(self.config.page_load_time);
                    self.processes[idx].loaded_write = Some(page);
                    self.pending.push(TraceLine::PageFault {
                        at: now,
                        process: self.processes[idx].id.clone(),
                        kind: AccessKind::Write,
                        until,
                    });
                }
                self.block(idx, until);
            }
            Event::Sleep(duration) => {
                let until = now.saturating_add(duration);
                self.processes[idx].advance();
                self.pending.push(TraceLine::Sleep {
                    at: now,
                    process: self.processes[idx].id.clone(),
                    until,
                });
                self.block(idx, until);
            }
            Event::Terminate => {
                let process = &mut self.processes[idx];
                process.advance();
                process.state = ProcessState::Terminated { at: now };
                let first = process.first_dispatch.unwrap_or(now);
                self.stats
                    .record_termination(now - process.arrival, first - process.arrival);
                log::debug!("t={}: {} terminated", now, process.id);
                self.running = None;
            }
        }
    }

    fn touch(&mut self, idx: usize, page: u32, kind: AccessKind) -> bool {
        let owner = &self.processes[idx].id;
        self.frames
            .access_page(owner, page, kind, self.clock, &self.processes)
    }

    fn block(&mut self, idx: usize, until: u64) {
        self.processes[idx].state = ProcessState::Blocked { until };
        self.blocked.push(Reverse((until, self.input_order[idx], idx)));
        self.running = None;
    }

    /// Trace collected by `run`; empty after `run_with`
    pub fn trace(&self) -> &[TraceLine] {
        &self.trace
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.frames
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn report(&self) -> Report {
        self.stats.report(&self.frames)
    }

    pub fn frame_snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.frames)
    }

    /// Final report followed by the memory dump
    pub fn summary(&self) -> String {
        format!("{}\n{}", self.report(), self.frame_snapshot())
    }
}
