use std::fmt;

/// One step of a process's workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Use the CPU for the given number of ms
    Compute(u64),
    Read(u32),
    Write(u32),
    /// Block for the given number of ms without touching memory
    Sleep(u64),
    Terminate,
}

impl Event {
    /// Page touched by this event, if it is a memory access
    #[inline]
    pub fn page(&self) -> Option<u32> {
        match *self {
            Event::Read(page) | Event::Write(page) => Some(page),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Compute(d) => write!(f, "CALCUL({})", d),
            Event::Read(p) => write!(f, "LECTURE({})", p),
            Event::Write(p) => write!(f, "ECRITURE({})", p),
            Event::Sleep(d) => write!(f, "DORMIR({})", d),
            Event::Terminate => write!(f, "FIN"),
        }
    }
}

/// Where a process is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Unarrived,
    Ready,
    Running,
    Blocked { until: u64 },
    Terminated { at: u64 },
}

#[derive(Debug, Clone)]
pub struct Process {
    pub id: String,
    pub arrival: u64,
    /// Carried from the input; FCFS ignores it
    pub priority: i64,
    events: Vec<Event>,
    cursor: usize,
    pub state: ProcessState,
    pub first_dispatch: Option<u64>,
    /// Page of the current write once its fault-driven load has completed
    pub loaded_write: Option<u32>,
}

impl Process {
    pub fn new(id: impl Into<String>, arrival: u64, priority: i64, events: Vec<Event>) -> Self {
        Process {
            id: id.into(),
            arrival,
            priority,
            events,
            cursor: 0,
            state: ProcessState::Unarrived,
            first_dispatch: None,
            loaded_write: None,
        }
    }

    /// Event under the cursor, `None` once the sequence is exhausted
    #[inline]
    pub fn current_event(&self) -> Option<Event> {
        self.events.get(self.cursor).copied()
    }

    #[inline]
    pub fn advance(&mut self) {
        if self.cursor < self.events.len() {
            self.cursor += 1;
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn remaining_events(&self) -> &[Event] {
        &self.events[self.cursor..]
    }

    /// Number of events until this process next touches `page`, counting
    /// from the cursor. `None` if it never does again.
    pub fn next_use(&self, page: u32) -> Option<usize> {
        self.remaining_events()
            .iter()
            .position(|event| event.page() == Some(page))
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, ProcessState::Terminated { .. })
    }
}

/// Lookahead into future page references, used by the Optimal policy
pub trait FutureReferences {
    /// Distance (in events) until `owner` next references `page`
    fn next_use(&self, owner: &str, page: u32) -> Option<usize>;
}

/// No knowledge of the future: every page looks unused from now on
pub struct NoLookahead;

impl FutureReferences for NoLookahead {
    fn next_use(&self, _owner: &str, _page: u32) -> Option<usize> {
        None
    }
}

impl FutureReferences for Vec<Process> {
    fn next_use(&self, owner: &str, page: u32) -> Option<usize> {
        self.iter()
            .find(|p| p.id == owner)
            .and_then(|p| p.next_use(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Process {
        Process::new(
            "P1",
            5,
            0,
            vec![Event::Compute(10), Event::Read(3), Event::Write(7), Event::Read(3), Event::Terminate],
        )
    }

    #[test]
    fn test_new_process_starts_unarrived() {
        let p = sample();
        assert_eq!(p.state, ProcessState::Unarrived);
        assert_eq!(p.first_dispatch, None);
        assert_eq!(p.loaded_write, None);
        assert_eq!(p.current_event(), Some(Event::Compute(10)));
    }

    #[test]
    fn test_cursor_advances_and_stops_at_end() {
        let mut p = sample();
        for _ in 0..10 {
            p.advance();
        }
        assert_eq!(p.current_event(), None);
        assert!(p.remaining_events().is_empty());
    }

    #[test]
    fn test_next_use_counts_from_cursor() {
        let mut p = sample();
        assert_eq!(p.next_use(3), Some(1));
        assert_eq!(p.next_use(7), Some(2));
        assert_eq!(p.next_use(99), None);

        p.advance();
        p.advance(); // past the first read of page 3
        assert_eq!(p.next_use(3), Some(1));
    }

    #[test]
    fn test_lookahead_over_process_slice() {
        let procs = vec![sample(), Process::new("P2", 0, 0, vec![Event::Write(3)])];
        assert_eq!(procs.next_use("P2", 3), Some(0));
        assert_eq!(procs.next_use("P1", 7), Some(2));
        assert_eq!(procs.next_use("P3", 3), None);
        assert_eq!(NoLookahead.next_use("P1", 3), None);
    }

    #[test]
    fn test_event_display_uses_input_tags() {
        assert_eq!(Event::Compute(30).to_string(), "CALCUL(30)");
        assert_eq!(Event::Write(2).to_string(), "ECRITURE(2)");
        assert_eq!(Event::Terminate.to_string(), "FIN");
    }
}
