pub mod assertion_rules;
pub mod selector;
pub mod test_generator;
