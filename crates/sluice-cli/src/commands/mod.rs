//! CLI command implementations.

pub mod cat;
pub mod copy;
pub mod inspect;
