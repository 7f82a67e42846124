pub mod config;
pub mod driver;
pub mod phase;
pub mod report;
pub mod stats;
pub mod store;
pub mod worker;
pub mod workload;
