//! Types shared by the resolver and the format drivers.
//!
//! `DestDir` and `ResolvedPath` can only be obtained through validation:
//! a `DestDir` is canonical, and a `ResolvedPath` has been proven to lie
//! inside one.

pub mod dest_dir;
pub mod entry;
pub mod resolved_path;

pub use dest_dir::DestDir;
pub use entry::ArchiveEntry;
pub use entry::EntryType;
pub use resolved_path::ResolvedPath;
