pub mod extractor;
pub mod normalizer;
pub mod resolver;
pub mod state;
pub mod stats;
pub mod tiers;
pub mod validator;

#[cfg(test)]
mod boundary_tests;
