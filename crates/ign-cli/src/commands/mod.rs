//! Command handlers, one module per subcommand.

mod apply;

pub mod checkout;
pub mod completions;
pub mod config;
pub mod init;
pub mod template;
pub mod update;
