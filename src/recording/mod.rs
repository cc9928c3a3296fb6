pub mod consolidate;
pub mod flow_grouper;
pub mod interaction_model;
pub mod session;
