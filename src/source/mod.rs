pub mod document;
pub mod index;
pub mod resolver;
