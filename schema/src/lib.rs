// Pokemon Trainer Schema - Shared type definitions
// This crate holds the plain data exchanged between the reference-data
// providers, the training simulator and the HTTP layer.

// Re-export the main types
pub use creature::*;
pub use training::*;

pub mod creature;
pub mod training;
