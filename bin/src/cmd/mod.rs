//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod describe;
pub(crate) mod process;
pub(crate) mod report;
pub(crate) mod rolling;
pub(crate) mod select;
pub(crate) mod stats;
