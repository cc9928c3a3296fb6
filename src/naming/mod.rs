pub mod strategy;
pub mod unique;

pub use strategy::{NameRequest, NamingStrategy};
pub use unique::{make_unique, UsedNames};
