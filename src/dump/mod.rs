// ABOUTME: Dump segmentation module for plain-text pg_dump files
// ABOUTME: Scans marker comments into typed blocks and rewrites COPY data as INSERTs

pub mod block;
pub mod copy;
pub mod scanner;

pub use block::{Block, ObjectKind};
pub use copy::{copy_to_inserts, escape_value, CopyBlock, DEFAULT_BATCH_SIZE};
pub use scanner::{scan, split_prefix, DATA_MARKER, OBJECT_MARKER};
