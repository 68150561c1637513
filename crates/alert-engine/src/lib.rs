pub mod engine;
pub mod partition;
pub mod rules;

#[cfg(test)]
mod rules_tests;

pub use engine::*;
pub use partition::*;
pub use rules::*;
