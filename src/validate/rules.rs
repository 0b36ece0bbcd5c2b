//! Field-level validation rules
//!
//! Every rule is total: bad input yields a [`RuleViolation`], never a
//! panic. The violation's `Display` text is the message shown to the user.

use crate::job::{Runtime, RuntimeParseError};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;
use thiserror::Error;

/// Substrings a job name may not contain (case-insensitive)
pub const RESERVED_WORDS: [&str; 7] = ["spark", "janelia", "master", "int", "admin", "root", "system"];

/// Environment variables a job may not override
pub const RESERVED_VARIABLES: [&str; 7] =
    ["PATH", "HOME", "USER", "PWD", "SHELL", "LSB_JOBID", "LSB_JOBINDEX"];

/// Default slot ceiling
pub const DEFAULT_MAX_SLOTS: u32 = 64;

/// Default GPU ceiling
pub const DEFAULT_MAX_GPUS: u32 = 8;

/// Largest array
pub const MAX_BATCH_TASKS: i64 = 10_000;

pub const MAX_NAME_LENGTH: usize = 100;

pub const MAX_ENV_VALUE_LENGTH: usize = 1000;

/// 2TB, in megabytes
pub const MAX_MEMORY_MB: f64 = 2048.0 * 1024.0;

/// Application profile that requires 48-slot multiples
pub const PARALLEL_48: &str = "parallel-48";

/// A single failed rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Job name is required")]
    NameMissing,
    #[error("Job name cannot be empty or whitespace only")]
    NameBlank,
    #[error("Job name must be {MAX_NAME_LENGTH} characters or less")]
    NameTooLong,
    #[error("Job name cannot contain spaces")]
    NameHasSpace,
    #[error("Job name can only contain letters, numbers, underscores, and hyphens")]
    NameCharacters,
    #[error("Job name cannot contain reserved word: {0}")]
    NameReservedWord(&'static str),

    #[error("{0}")]
    Time(RuntimeParseError),

    #[error("Number of slots must be at least 1")]
    SlotsTooFew,
    #[error("Number of slots cannot exceed {0}")]
    SlotsTooMany(u32),

    #[error("Number of GPUs must be at least 1")]
    GpusTooFew,
    #[error("Number of GPUs cannot exceed {0}")]
    GpusTooMany(u32),

    #[error("File path should be absolute (start with /)")]
    PathNotAbsolute,
    #[error("File path contains invalid characters")]
    PathCharacters,

    #[error("Command is required")]
    CommandMissing,
    #[error("Command cannot be empty or whitespace only")]
    CommandBlank,
    #[error("Command contains potentially dangerous patterns")]
    CommandDangerous,

    #[error("Array start index must be at least 1")]
    BatchStart,
    #[error("Array end index must be greater than or equal to start index")]
    BatchEnd,
    #[error("Array step must be at least 1")]
    BatchStep,
    #[error("Array job cannot have more than 10,000 tasks")]
    BatchTooLarge,

    #[error("Memory must be specified as number followed by optional unit (G, M, K)")]
    MemoryFormat,
    #[error("Memory requirement must be at least 1MB")]
    MemoryTooSmall,
    #[error("Memory requirement cannot exceed 2TB")]
    MemoryTooLarge,

    #[error("Environment variable name is required")]
    EnvNameMissing,
    #[error("Environment variable name must start with letter or underscore, contain only letters, numbers, and underscores")]
    EnvNameFormat,
    #[error("Cannot override reserved environment variable: {0}")]
    EnvReserved(String),
    #[error("Environment variable value cannot exceed {MAX_ENV_VALUE_LENGTH} characters")]
    EnvValueTooLong,

    #[error("Parallel environment is required for MPI jobs")]
    ParallelEnvironmentMissing,
    #[error("MPI jobs with parallel-48 must request slots in multiples of 48")]
    SlotsNotMultipleOf48,
}

/// Outcome of a single rule
pub type RuleResult = std::result::Result<(), RuleViolation>;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

fn job_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    regex(&PATTERN, r"^[a-zA-Z0-9_-]+$")
}

fn env_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    regex(&PATTERN, r"^[A-Za-z_][A-Za-z0-9_]*$")
}

fn memory_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        RegexBuilder::new(r"^([0-9]+)([GMK]?)$")
            .case_insensitive(true)
            .build()
            .expect("valid regex")
    })
}

fn dangerous_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"rm\s+-rf\s+/",
            r":\(\)\{.*\|.*&.*\};:",
            r">\s*/dev/sd[a-z]",
            r"sudo\s+rm",
        ]
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("valid regex")
        })
        .collect()
    })
}

/// Job name policy
pub fn validate_name(name: &str) -> RuleResult {
    if name.is_empty() {
        return Err(RuleViolation::NameMissing);
    }
    if name.trim().is_empty() {
        return Err(RuleViolation::NameBlank);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(RuleViolation::NameTooLong);
    }
    if name.contains(' ') {
        return Err(RuleViolation::NameHasSpace);
    }
    if !job_name_pattern().is_match(name) {
        return Err(RuleViolation::NameCharacters);
    }

    let lower = name.to_lowercase();
    match RESERVED_WORDS.iter().find(|word| lower.contains(*word)) {
        Some(word) => Err(RuleViolation::NameReservedWord(word)),
        None => Ok(()),
    }
}

/// `MM` or `HH:MM`; empty means no limit
pub fn validate_time(value: &str) -> RuleResult {
    if value.is_empty() {
        return Ok(());
    }
    value.parse::<Runtime>().map(|_| ()).map_err(RuleViolation::Time)
}

/// Slot count against a ceiling
pub fn validate_slots(slots: u32, max_slots: u32) -> RuleResult {
    if slots < 1 {
        return Err(RuleViolation::SlotsTooFew);
    }
    if slots > max_slots {
        return Err(RuleViolation::SlotsTooMany(max_slots));
    }
    Ok(())
}

/// GPU count against a ceiling
pub fn validate_gpu_count(count: u32, max_gpus: u32) -> RuleResult {
    if count < 1 {
        return Err(RuleViolation::GpusTooFew);
    }
    if count > max_gpus {
        return Err(RuleViolation::GpusTooMany(max_gpus));
    }
    Ok(())
}

/// File path; empty is accepted
pub fn validate_file_path(path: &str, must_be_absolute: bool) -> RuleResult {
    if path.is_empty() {
        return Ok(());
    }
    if must_be_absolute && !path.starts_with('/') {
        return Err(RuleViolation::PathNotAbsolute);
    }
    if path.contains(['<', '>', '|', '*', '?']) {
        return Err(RuleViolation::PathCharacters);
    }
    Ok(())
}

/// Command text. The pattern screen is a courtesy check, not a sandbox.
pub fn validate_command(command: &str) -> RuleResult {
    if command.is_empty() {
        return Err(RuleViolation::CommandMissing);
    }
    if command.trim().is_empty() {
        return Err(RuleViolation::CommandBlank);
    }
    if dangerous_patterns().iter().any(|re| re.is_match(command)) {
        return Err(RuleViolation::CommandDangerous);
    }
    Ok(())
}

/// Array range: `(end - start) / step + 1` tasks, at most 10,000
pub fn validate_batch_range(start: i64, end: i64, step: i64) -> RuleResult {
    if start < 1 {
        return Err(RuleViolation::BatchStart);
    }
    if end < start {
        return Err(RuleViolation::BatchEnd);
    }
    if step < 1 {
        return Err(RuleViolation::BatchStep);
    }
    if (end - start) / step + 1 > MAX_BATCH_TASKS {
        return Err(RuleViolation::BatchTooLarge);
    }
    Ok(())
}

/// Memory amount such as `16G`, `512m`, `1024` (megabytes)
pub fn validate_memory(value: &str) -> RuleResult {
    if value.is_empty() {
        return Ok(());
    }
    let caps = memory_pattern()
        .captures(value)
        .ok_or(RuleViolation::MemoryFormat)?;

    // Digits that overflow u64 are certainly above the ceiling
    let amount: f64 = match caps[1].parse::<u64>() {
        Ok(n) => n as f64,
        Err(_) => return Err(RuleViolation::MemoryTooLarge),
    };
    let megabytes = match caps[2].to_ascii_uppercase().as_str() {
        "G" => amount * 1024.0,
        "K" => amount / 1024.0,
        _ => amount,
    };

    if megabytes < 1.0 {
        return Err(RuleViolation::MemoryTooSmall);
    }
    if megabytes > MAX_MEMORY_MB {
        return Err(RuleViolation::MemoryTooLarge);
    }
    Ok(())
}

/// Environment override name and value
pub fn validate_environment_variable(name: &str, value: &str) -> RuleResult {
    if name.is_empty() {
        return Err(RuleViolation::EnvNameMissing);
    }
    if !env_name_pattern().is_match(name) {
        return Err(RuleViolation::EnvNameFormat);
    }
    if RESERVED_VARIABLES.contains(&name) {
        return Err(RuleViolation::EnvReserved(name.to_string()));
    }
    if value.chars().count() > MAX_ENV_VALUE_LENGTH {
        return Err(RuleViolation::EnvValueTooLong);
    }
    Ok(())
}

/// MPI jobs need an application profile; `parallel-48` needs 48-slot multiples
pub fn validate_parallel_environment(parallel_environment: Option<&str>, slots: u32) -> RuleResult {
    match parallel_environment {
        None | Some("") => Err(RuleViolation::ParallelEnvironmentMissing),
        Some(PARALLEL_48) if slots % 48 != 0 => Err(RuleViolation::SlotsNotMultipleOf48),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("test_cpu"), Ok(()));
        assert_eq!(validate_name("align-2024"), Ok(()));
        assert_eq!(validate_name(""), Err(RuleViolation::NameMissing));
        assert_eq!(validate_name("   "), Err(RuleViolation::NameBlank));
        assert_eq!(validate_name("my job"), Err(RuleViolation::NameHasSpace));
        assert_eq!(validate_name("job.1"), Err(RuleViolation::NameCharacters));
        assert_eq!(validate_name(&"a".repeat(101)), Err(RuleViolation::NameTooLong));
        assert_eq!(validate_name(&"a".repeat(100)), Ok(()));
    }

    #[test]
    fn test_reserved_word_is_cited() {
        let err = validate_name("spark_job").unwrap_err();
        assert_eq!(err, RuleViolation::NameReservedWord("spark"));
        assert!(err.to_string().contains("spark"));

        // case-insensitive substring
        assert_eq!(validate_name("MyROOTjob"), Err(RuleViolation::NameReservedWord("root")));
        assert_eq!(validate_name("print_stats"), Err(RuleViolation::NameReservedWord("int")));
    }

    #[test]
    fn test_time_rules() {
        assert_eq!(validate_time(""), Ok(()));
        assert_eq!(validate_time("1:00"), Ok(()));
        assert_eq!(validate_time("999:59"), Ok(()));
        assert_eq!(validate_time("59999"), Ok(()));
        assert!(validate_time("999:60").is_err());
        assert_eq!(
            validate_time("60000").unwrap_err().to_string(),
            "Minutes cannot exceed 59999"
        );
        assert_eq!(
            validate_time("2h").unwrap_err().to_string(),
            "Time must be in format MM or HH:MM"
        );
    }

    #[test]
    fn test_slot_and_gpu_ceilings() {
        assert_eq!(validate_slots(1, DEFAULT_MAX_SLOTS), Ok(()));
        assert_eq!(validate_slots(64, DEFAULT_MAX_SLOTS), Ok(()));
        assert_eq!(validate_slots(0, DEFAULT_MAX_SLOTS), Err(RuleViolation::SlotsTooFew));
        assert_eq!(validate_slots(65, DEFAULT_MAX_SLOTS), Err(RuleViolation::SlotsTooMany(64)));
        assert_eq!(validate_slots(20, 16), Err(RuleViolation::SlotsTooMany(16)));

        assert_eq!(validate_gpu_count(8, DEFAULT_MAX_GPUS), Ok(()));
        assert_eq!(validate_gpu_count(0, DEFAULT_MAX_GPUS), Err(RuleViolation::GpusTooFew));
        assert_eq!(validate_gpu_count(9, DEFAULT_MAX_GPUS), Err(RuleViolation::GpusTooMany(8)));
    }

    #[test]
    fn test_file_path_rules() {
        assert_eq!(validate_file_path("", true), Ok(()));
        assert_eq!(validate_file_path("/groups/lab/out.log", true), Ok(()));
        assert_eq!(validate_file_path("out.log", true), Err(RuleViolation::PathNotAbsolute));
        assert_eq!(validate_file_path("out.log", false), Ok(()));
        assert_eq!(validate_file_path("/tmp/out*.log", true), Err(RuleViolation::PathCharacters));
        assert_eq!(validate_file_path("/tmp/a|b", false), Err(RuleViolation::PathCharacters));
    }

    #[test]
    fn test_command_rules() {
        assert_eq!(validate_command("python train.py --epochs 10"), Ok(()));
        assert_eq!(validate_command(""), Err(RuleViolation::CommandMissing));
        assert_eq!(validate_command("  \t"), Err(RuleViolation::CommandBlank));
        for bad in [
            "rm -rf /",
            "RM  -RF /home",
            ":(){ :|:& };:",
            "cat image > /dev/sda",
            "sudo rm file",
        ] {
            assert_eq!(validate_command(bad), Err(RuleViolation::CommandDangerous), "{}", bad);
        }
        assert_eq!(validate_command("rm -rf ./build"), Ok(()));
    }

    #[test]
    fn test_batch_range_rules() {
        assert_eq!(validate_batch_range(1, 100, 1), Ok(()));
        assert_eq!(validate_batch_range(0, 100, 1), Err(RuleViolation::BatchStart));
        assert_eq!(validate_batch_range(10, 5, 1), Err(RuleViolation::BatchEnd));
        assert_eq!(validate_batch_range(1, 5, 0), Err(RuleViolation::BatchStep));
        assert_eq!(validate_batch_range(1, 10_000, 1), Ok(()));
        assert_eq!(validate_batch_range(1, 10_001, 1), Err(RuleViolation::BatchTooLarge));
        assert_eq!(validate_batch_range(1, 20_001, 2), Err(RuleViolation::BatchTooLarge));
        assert_eq!(validate_batch_range(1, 19_999, 2), Ok(()));
    }

    #[test]
    fn test_memory_rules() {
        assert_eq!(validate_memory(""), Ok(()));
        assert_eq!(validate_memory("16G"), Ok(()));
        assert_eq!(validate_memory("512m"), Ok(()));
        assert_eq!(validate_memory("1024"), Ok(()));
        assert_eq!(validate_memory("2048K"), Ok(()));
        assert_eq!(validate_memory("2048G"), Ok(()));
        assert_eq!(validate_memory("2049G"), Err(RuleViolation::MemoryTooLarge));
        assert_eq!(validate_memory("512K"), Err(RuleViolation::MemoryTooSmall));
        assert_eq!(validate_memory("0"), Err(RuleViolation::MemoryTooSmall));
        assert_eq!(validate_memory("16GB"), Err(RuleViolation::MemoryFormat));
        assert_eq!(validate_memory("lots"), Err(RuleViolation::MemoryFormat));
        assert_eq!(validate_memory("99999999999999999999999"), Err(RuleViolation::MemoryTooLarge));
    }

    #[test]
    fn test_environment_variable_rules() {
        assert_eq!(validate_environment_variable("OMP_NUM_THREADS", "8"), Ok(()));
        assert_eq!(validate_environment_variable("_private", ""), Ok(()));
        assert_eq!(validate_environment_variable("", "x"), Err(RuleViolation::EnvNameMissing));
        assert_eq!(validate_environment_variable("1BAD", "x"), Err(RuleViolation::EnvNameFormat));
        assert_eq!(validate_environment_variable("MY-VAR", "x"), Err(RuleViolation::EnvNameFormat));

        let err = validate_environment_variable("PATH", "/usr/bin").unwrap_err();
        assert_eq!(err, RuleViolation::EnvReserved("PATH".to_string()));
        assert!(err.to_string().contains("PATH"));

        assert_eq!(
            validate_environment_variable("BIG", &"x".repeat(1001)),
            Err(RuleViolation::EnvValueTooLong)
        );
    }

    #[test]
    fn test_parallel_environment_rules() {
        assert_eq!(validate_parallel_environment(Some("parallel-48"), 96), Ok(()));
        assert_eq!(
            validate_parallel_environment(Some("parallel-48"), 50),
            Err(RuleViolation::SlotsNotMultipleOf48)
        );
        assert_eq!(validate_parallel_environment(Some("openmpi"), 50), Ok(()));
        assert_eq!(
            validate_parallel_environment(None, 48),
            Err(RuleViolation::ParallelEnvironmentMissing)
        );
    }

    proptest! {
        #[test]
        fn prop_plain_names_pass(name in "[A-Za-z0-9_-]{1,100}") {
            let lower = name.to_lowercase();
            prop_assume!(!RESERVED_WORDS.iter().any(|w| lower.contains(w)));
            prop_assert_eq!(validate_name(&name), Ok(()));
        }

        #[test]
        fn prop_names_with_space_fail(left in "[a-z]{0,10}", right in "[a-z]{0,10}") {
            let name = format!("{} {}", left, right);
            prop_assert!(validate_name(&name).is_err());
        }

        #[test]
        fn prop_hhmm_in_range_passes(hours in 0u32..=999, minutes in 0u32..=59) {
            let value = format!("{}:{:02}", hours, minutes);
            prop_assert_eq!(validate_time(&value), Ok(()));
        }
    }
}
