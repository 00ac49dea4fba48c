//! Subcommand implementations.

pub mod blast;
pub mod init;
pub mod policy;
pub mod simulate;
pub mod validate;
