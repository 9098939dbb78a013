//! The fetch pipeline: plan one task per station, run the tasks
//! concurrently, then merge their results into one table.

pub mod error;
pub mod executor;
pub mod planner;
pub mod reshaper;
