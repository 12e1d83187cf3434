//! File system storage management
//!
//! Handles path resolution inside the base directory and the six file
//! operations built on top of it.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::{copy_file, delete_file, list_directory, move_file, read_file, write_file};
pub use results::{DeleteResult, DirEntry, EntryKind, ListResult, ReadResult, TransferResult, WriteResult};
pub use validation::BaseDir;
