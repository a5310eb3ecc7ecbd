/*!
 * Simulator Configuration
 * Key-value config file parsing and validation
 */

use crate::core::Size;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Base length of one simulated instruction tick, in milliseconds.
pub const BASE_TICK_MS: u64 = 100;

/// Configuration result
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Scheduling discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingPolicy {
    /// First-come-first-served: one burst runs a process to completion
    Fcfs,
    /// Round-robin with a fixed tick quantum
    Rr,
}

impl FromStr for SchedulingPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fcfs" => Ok(Self::Fcfs),
            "rr" => Ok(Self::Rr),
            _ => Err(()),
        }
    }
}

/// Memory allocation strategy, derived from the per-process memory range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// Equal min/max per-process memory: contiguous byte-range allocation
    Flat,
    /// Unequal range: fixed-size frame allocation
    Paging,
}

/// Full simulator configuration, read once at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimConfig {
    pub num_cpu: usize,
    pub scheduler: SchedulingPolicy,
    pub quantum_cycles: u64,
    pub batch_process_freq: u64,
    pub min_ins: u64,
    pub max_ins: u64,
    pub delay_per_exec: u64,
    pub max_overall_mem: Size,
    pub mem_per_frame: Size,
    pub min_mem_per_proc: Size,
    pub max_mem_per_proc: Size,
}

impl SimConfig {
    /// Read a `key value` per line config file (the original format).
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str_contents(&contents)
    }

    pub fn from_str_contents(contents: &str) -> ConfigResult<Self> {
        let mut values: HashMap<&str, &str> = HashMap::new();
        for line in contents.lines() {
            let mut parts = line.split_whitespace();
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                values.insert(key, value);
            }
        }

        let config = Self {
            num_cpu: parse(&values, "num-cpu")?,
            scheduler: {
                let raw = *values
                    .get("scheduler")
                    .ok_or(ConfigError::MissingKey("scheduler"))?;
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "scheduler",
                    value: raw.to_string(),
                })?
            },
            quantum_cycles: parse(&values, "quantum-cycles")?,
            batch_process_freq: parse(&values, "batch-process-freq")?,
            min_ins: parse(&values, "min-ins")?,
            max_ins: parse(&values, "max-ins")?,
            delay_per_exec: parse(&values, "delays-per-exec")?,
            max_overall_mem: parse(&values, "max-overall-mem")?,
            mem_per_frame: parse(&values, "mem-per-frame")?,
            min_mem_per_proc: parse(&values, "min-mem-per-proc")?,
            max_mem_per_proc: parse(&values, "max-mem-per-proc")?,
        };

        config.validate()?;
        info!(
            "Config loaded: {} cores, {:?} scheduling, {:?} memory",
            config.num_cpu,
            config.scheduler,
            config.memory_mode()
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_cpu < 1 || self.num_cpu > 128 {
            return Err(ConfigError::Validation(
                "num-cpu must be between 1 and 128".into(),
            ));
        }
        if self.scheduler == SchedulingPolicy::Rr && self.quantum_cycles < 1 {
            return Err(ConfigError::Validation(
                "quantum-cycles must be at least 1 for rr".into(),
            ));
        }
        if self.batch_process_freq < 1 {
            return Err(ConfigError::Validation(
                "batch-process-freq must be at least 1".into(),
            ));
        }
        if self.min_ins < 1 || self.max_ins < self.min_ins {
            return Err(ConfigError::Validation(
                "instruction range requires 1 <= min-ins <= max-ins".into(),
            ));
        }
        if self.mem_per_frame < 1 || self.max_overall_mem < self.mem_per_frame {
            return Err(ConfigError::Validation(
                "max-overall-mem must be >= mem-per-frame, and mem-per-frame >= 1".into(),
            ));
        }
        if self.min_mem_per_proc < 1 || self.max_mem_per_proc < self.min_mem_per_proc {
            return Err(ConfigError::Validation(
                "per-process memory range requires 1 <= min <= max".into(),
            ));
        }
        // A footprint larger than total capacity can never be admitted,
        // even with every resident evicted
        if self.max_mem_per_proc > self.max_overall_mem {
            return Err(ConfigError::Validation(
                "max-mem-per-proc must not exceed max-overall-mem".into(),
            ));
        }
        Ok(())
    }

    /// Equal min/max per-process memory selects the flat allocator.
    pub fn memory_mode(&self) -> MemoryMode {
        if self.min_mem_per_proc == self.max_mem_per_proc {
            MemoryMode::Flat
        } else {
            MemoryMode::Paging
        }
    }

    /// Sleep duration for one burst tick. `delays-per-exec` multiplies the
    /// base tick; zero still costs one base tick.
    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(BASE_TICK_MS.saturating_mul(self.delay_per_exec.max(1)))
    }
}

fn parse<T: FromStr>(values: &HashMap<&str, &str>, key: &'static str) -> ConfigResult<T> {
    let raw = values.get(key).ok_or(ConfigError::MissingKey(key))?;
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
num-cpu 4
scheduler rr
quantum-cycles 5
batch-process-freq 1
min-ins 100
max-ins 200
delays-per-exec 0
max-overall-mem 16384
mem-per-frame 16
min-mem-per-proc 4096
max-mem-per-proc 4096
";

    #[test]
    fn test_parse_sample() {
        let config = SimConfig::from_str_contents(SAMPLE).unwrap();
        assert_eq!(config.num_cpu, 4);
        assert_eq!(config.scheduler, SchedulingPolicy::Rr);
        assert_eq!(config.quantum_cycles, 5);
        assert_eq!(config.max_overall_mem, 16384);
        assert_eq!(config.memory_mode(), MemoryMode::Flat);
    }

    #[test]
    fn test_unequal_proc_memory_selects_paging() {
        let contents = SAMPLE.replace("min-mem-per-proc 4096", "min-mem-per-proc 1024");
        let config = SimConfig::from_str_contents(&contents).unwrap();
        assert_eq!(config.memory_mode(), MemoryMode::Paging);
    }

    #[test]
    fn test_missing_key() {
        let contents = SAMPLE.replace("quantum-cycles 5\n", "");
        let err = SimConfig::from_str_contents(&contents).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("quantum-cycles")));
    }

    #[test]
    fn test_invalid_scheduler_rejected() {
        let contents = SAMPLE.replace("scheduler rr", "scheduler sjf");
        let err = SimConfig::from_str_contents(&contents).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "scheduler",
                ..
            }
        ));
    }

    #[test]
    fn test_validation_bounds() {
        let contents = SAMPLE.replace("num-cpu 4", "num-cpu 0");
        assert!(SimConfig::from_str_contents(&contents).is_err());

        let contents = SAMPLE.replace("mem-per-frame 16", "mem-per-frame 32768");
        assert!(SimConfig::from_str_contents(&contents).is_err());
    }

    #[test]
    fn test_tick_delay() {
        let config = SimConfig::from_str_contents(SAMPLE).unwrap();
        assert_eq!(config.tick_delay(), Duration::from_millis(BASE_TICK_MS));

        let contents = SAMPLE.replace("delays-per-exec 0", "delays-per-exec 3");
        let config = SimConfig::from_str_contents(&contents).unwrap();
        assert_eq!(config.tick_delay(), Duration::from_millis(BASE_TICK_MS * 3));
    }

    #[test]
    fn test_tick_delay_large_multiplier_not_truncated() {
        // 5e9 exceeds u32::MAX; the full value must survive
        let contents = SAMPLE.replace("delays-per-exec 0", "delays-per-exec 5000000000");
        let config = SimConfig::from_str_contents(&contents).unwrap();
        assert_eq!(
            config.tick_delay(),
            Duration::from_millis(500_000_000_000)
        );
    }

    #[test]
    fn test_proc_memory_exceeding_capacity_rejected() {
        let contents = SAMPLE.replace("max-overall-mem 16384", "max-overall-mem 2048");
        let err = SimConfig::from_str_contents(&contents).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = SimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.num_cpu, 4);
    }
}
