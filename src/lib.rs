pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod process;
pub mod replacement;
pub mod scheduler;
pub mod stats;

// Re-export commonly used items for convenience
pub use config::SimConfig;
pub use error::{ConfigError, SimError, SimResult, TraceParseError};
pub use memory::{AccessKind, AllocationPolicy, FrameTable};
pub use process::{Event, Process, ProcessState};
pub use replacement::{Algorithm, ReplacementPolicy};
pub use scheduler::{Simulator, TraceLine};
pub use stats::{FrameSnapshot, Report, Statistics};
