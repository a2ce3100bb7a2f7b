// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports the split and inspect commands

pub mod inspect;
pub mod split;

pub use inspect::inspect;
pub use split::{split, SplitOptions, SplitSummary};
