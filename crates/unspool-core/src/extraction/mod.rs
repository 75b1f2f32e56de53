//! Per-call extraction state shared by the format drivers.

pub mod context;
pub mod pending;

pub use context::ExtractionContext;
pub use pending::PendingHardLink;
pub use pending::PendingLinks;
