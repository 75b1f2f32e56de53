//! Common trait for archive format drivers.

use crate::Result;
use crate::extraction::ExtractionContext;

/// A format driver that materializes its entries under the context's
/// destination.
pub trait ArchiveFormat {
    /// Extracts every entry.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; extraction stops there.
    fn extract(&mut self, ctx: &mut ExtractionContext<'_>) -> Result<()>;

    /// Returns the archive format name.
    fn format_name(&self) -> &str;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::DestDir;
    use crate::ExtractOptions;
    use crate::NeverCancel;
    use crate::NoopTracker;

    struct EmptyFormat;

    impl ArchiveFormat for EmptyFormat {
        fn extract(&mut self, ctx: &mut ExtractionContext<'_>) -> Result<()> {
            ctx.check_cancelled()
        }

        fn format_name(&self) -> &str {
            "empty"
        }
    }

    #[test]
    fn test_trait_object() {
        let temp = tempfile::TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();
        let mut ctx = ExtractionContext::new(&dest, ExtractOptions::new(), &NeverCancel, &NoopTracker);

        let mut format: Box<dyn ArchiveFormat> = Box::new(EmptyFormat);
        assert_eq!(format.format_name(), "empty");
        format.extract(&mut ctx).unwrap();
    }
}
