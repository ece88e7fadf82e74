pub mod builtin;
pub mod lib;
pub mod types;

pub use builtin::{all_rules, find_rule};
pub use types::*;
