//! Counters exposed by the admission controller and snapshot scheduler

pub mod metrics;

pub use metrics::{AdmissionStats, CycleReport, SchedulerStats};
