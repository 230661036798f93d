//! Shared test infrastructure.
//!
//! Factories building bootstrapped registries with small class hierarchies, and test doubles
//! for the runtime collaborators. Only compiled for unit tests.

pub mod factories;
