//! Archive format implementations.

pub mod common;
pub mod compression;
pub mod detect;
pub mod tar;
pub mod traits;
pub mod zip;

pub use detect::ArchiveType;
pub use detect::detect_bytes;
pub use detect::detect_format;
pub use tar::TarArchive;
pub use traits::ArchiveFormat;
pub use zip::ZipArchive;
