use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{ConfigError, SimError};
use crate::memory::{AllocationPolicy, FrameTable};
use crate::replacement::Algorithm;

/// Everything the config file can set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Simulation horizon in ms
    pub horizon: u64,
    /// Clock-interrupt granularity in ms, 0 disables alignment
    pub clock_tick: u64,
    pub scheduling: String,
    /// Parsed but unused: FCFS never preempts
    pub quantum: u64,
    pub disk_write_time: u64,
    pub page_load_time: u64,
    pub allocation: AllocationPolicy,
    pub local_frames: usize,
    pub total_frames: usize,
    pub algorithm: Algorithm,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            horizon: 0,
            clock_tick: 0,
            scheduling: String::new(),
            quantum: 0,
            disk_write_time: 0,
            page_load_time: 0,
            allocation: AllocationPolicy::Local,
            local_frames: DEFAULT_LOCAL_FRAMES,
            total_frames: DEFAULT_TOTAL_FRAMES,
            algorithm: Algorithm::Fifo,
        }
    }
}

impl FromStr for AllocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "locale" | "local" => Ok(AllocationPolicy::Local),
            "globale" | "global" => Ok(AllocationPolicy::Global),
            _ => Err(ConfigError::UnknownAllocation(s.to_string())),
        }
    }
}

impl SimConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse `key=value` / `key: value` lines. Blank lines, `#` comments and
    /// unknown keys are ignored.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = SimConfig::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let (key, value) = match line.split_once('=').or_else(|| line.split_once(':')) {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (line, ""),
            };

            match key.to_lowercase().as_str() {
                "temps-simulation" => config.horizon = parse_int(key, value)?,
                "interruption-horloge" => config.clock_tick = parse_int(key, value)?,
                "processus-ordonnancement" => config.scheduling = value.to_string(),
                "processus-quantum" => config.quantum = parse_int(key, value)?,
                "temps-ecriture-disque" => config.disk_write_time = parse_int(key, value)?,
                "temps-charge-page" => config.page_load_time = parse_int(key, value)?,
                "pagination-politique-allocation" => config.allocation = value.parse()?,
                "pagination-nombre-cadres-locale" => config.local_frames = parse_int(key, value)?,
                "pagination-nombre-cadres" => config.total_frames = parse_int(key, value)?,
                "pagination-algorithme" => config.algorithm = value.parse()?,
                _ => log::debug!("ignoring unknown config key {:?}", key),
            }
        }

        if config.local_frames == 0 {
            return Err(ConfigError::ZeroCapacity("pagination-nombre-cadres-locale"));
        }
        if config.total_frames == 0 {
            return Err(ConfigError::ZeroCapacity("pagination-nombre-cadres"));
        }

        Ok(config)
    }

    /// Reject anything other than non-preemptive FCFS
    pub fn check_scheduling(&self) -> Result<(), SimError> {
        if self.scheduling.trim().eq_ignore_ascii_case(FCFS_KEYWORD) {
            Ok(())
        } else {
            Err(SimError::UnsupportedPolicy(self.scheduling.clone()))
        }
    }

    pub fn frame_table(&self) -> FrameTable {
        FrameTable::new(
            self.allocation,
            self.local_frames,
            self.total_frames,
            self.algorithm.build(),
        )
    }
}

fn parse_int<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}
