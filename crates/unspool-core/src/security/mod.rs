//! Path containment and name rewriting.
//!
//! - [`PathResolver`]: proves a candidate path stays inside the destination
//!   root, following pre-existing symlinks segment by segment.
//! - [`strip_components`]: removes leading components from entry names.

pub mod resolve;
pub mod strip;

pub use resolve::MAX_SYMLINK_HOPS;
pub use resolve::PathResolver;
pub use strip::strip_components;
