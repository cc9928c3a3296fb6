pub mod backup;
pub mod diff;
pub mod executor;
pub mod planner;
