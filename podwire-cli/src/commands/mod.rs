//! Command implementations for the podwire CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod inspect;
pub mod integrate;
pub mod status;
