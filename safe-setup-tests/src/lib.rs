pub mod factory;
pub mod memory_repo;
pub mod test_runner;

pub use memory_repo::MemoryRepo;

use chrono::Utc;

/// A suffix no earlier test run has used, for keys in shared databases
pub fn unique_suffix() -> u64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64
}
