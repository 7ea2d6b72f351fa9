use std::fmt;

use crate::memory::{AllocationPolicy, Frame, FrameTable};

/// Timing totals of the processes that reached `FIN`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    terminated: usize,
    turnaround_sum: u64,
    response_sum: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_termination(&mut self, turnaround: u64, response: u64) {
        self.terminated += 1;
        self.turnaround_sum += turnaround;
        self.response_sum += response;
    }

    pub fn terminated(&self) -> usize {
        self.terminated
    }

    pub fn mean_turnaround(&self) -> f64 {
        Self::mean(self.turnaround_sum, self.terminated)
    }

    pub fn mean_response(&self) -> f64 {
        Self::mean(self.response_sum, self.terminated)
    }

    fn mean(sum: u64, count: usize) -> f64 {
        if count == 0 { 0.0 } else { sum as f64 / count as f64 }
    }

    pub fn report(&self, frames: &FrameTable) -> Report {
        Report {
            terminated: self.terminated,
            mean_turnaround: self.mean_turnaround(),
            mean_response: self.mean_response(),
            faults: frames.fault_count(),
        }
    }
}

/// End-of-run figures
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub terminated: usize,
    pub mean_turnaround: f64,
    pub mean_response: f64,
    pub faults: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Terminated processes = {}", self.terminated)?;
        writeln!(f, "Mean turnaround = {:.2} ms", self.mean_turnaround)?;
        writeln!(f, "Mean response time = {:.2} ms", self.mean_response)
    }
}

/// Point-in-time copy of every resident frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub faults: u64,
    pub scopes: SnapshotScopes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotScopes {
    /// One list per process, ordered by process id
    Local(Vec<(String, Vec<Frame>)>),
    Global(Vec<Frame>),
}

impl FrameSnapshot {
    pub fn capture(frames: &FrameTable) -> Self {
        let scopes = match frames.allocation() {
            AllocationPolicy::Local => SnapshotScopes::Local(
                frames
                    .local_scopes()
                    .map(|(id, scope)| (id.to_string(), scope.frames().to_vec()))
                    .collect(),
            ),
            AllocationPolicy::Global => SnapshotScopes::Global(frames.global_scope().frames().to_vec()),
        };
        FrameSnapshot {
            faults: frames.fault_count(),
            scopes,
        }
    }
}

#[inline]
fn bit(flag: bool) -> u8 {
    u8::from(flag)
}

impl fmt::Display for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory usage:")?;
        writeln!(f, "Page faults: {}", self.faults)?;
        match &self.scopes {
            SnapshotScopes::Local(scopes) => {
                for (id, frames) in scopes {
                    writeln!(f, "Process {}:", id)?;
                    for frame in frames {
                        writeln!(
                            f,
                            "  Page {} (R={}, M={})",
                            frame.page,
                            bit(frame.referenced),
                            bit(frame.modified)
                        )?;
                    }
                }
            }
            SnapshotScopes::Global(frames) => {
                writeln!(f, "Global memory:")?;
                for frame in frames {
                    writeln!(
                        f,
                        "  Process {}, Page {} (R={}, M={})",
                        frame.owner,
                        frame.page,
                        bit(frame.referenced),
                        bit(frame.modified)
                    )?;
                }
            }
        }
        Ok(())
    }
}
