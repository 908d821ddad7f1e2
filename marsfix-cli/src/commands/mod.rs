//! CLI subcommands.

pub mod config;
pub mod convert;
pub mod distance;
pub mod media;
pub mod region;
pub mod replay;
