//! CLI module for redditscout - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
