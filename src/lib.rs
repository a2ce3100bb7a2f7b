// ABOUTME: Library module for pg-dump-splitter
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod dump;
pub mod migration;
pub mod utils;
