// frame capacities used when the config file leaves them out
pub const DEFAULT_LOCAL_FRAMES: usize = 4;
pub const DEFAULT_TOTAL_FRAMES: usize = 8;

// the only scheduling strategy the simulator runs (non-preemptive FCFS)
pub const FCFS_KEYWORD: &str = "FIFO";

// record layout of the process file: ID/arrival/priority/{EVENTS}
pub const RECORD_SEPARATOR: char = '/';
pub const RECORD_FIELDS: usize = 4;
pub const EVENT_SEPARATOR: char = ',';

pub const COMMENT_PREFIX: char = '#';
