//! Source-object stores the reconciler can read and patch.

mod file;
mod memory;

pub use file::FileSourceStore;
pub use memory::MemorySourceStore;
