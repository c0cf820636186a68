// casegen-common: shared types and utilities for the casegen workspace

pub mod adf;
pub mod error;
pub mod generation;
pub mod issue;
pub mod protocol;
pub mod types;
