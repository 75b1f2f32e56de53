//! Bounded, cancellable payload copy with a reusable buffer.
//!
//! Entry payloads are streamed through a fixed 32 KiB buffer that lives for
//! the whole extraction call. The copy never moves more than the caller's
//! limit and polls the cancellation token before the first chunk and every
//! [`CANCEL_CHECK_INTERVAL`] chunks after that (roughly every 320 KiB).

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::CancellationToken;
use crate::ExtractionError;

/// Size of the copy buffer (32 KiB).
const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Number of chunks copied between cancellation checks.
pub const CANCEL_CHECK_INTERVAL: usize = 10;

/// Stack-allocated buffer reused across copy operations.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use unspool_core::NeverCancel;
/// use unspool_core::copy::CopyBuffer;
/// use unspool_core::copy::copy_with_cancel;
///
/// let mut buffer = CopyBuffer::new();
/// let mut input = Cursor::new(b"hello world".to_vec());
/// let mut output = Vec::new();
///
/// let copied = copy_with_cancel(&mut output, &mut input, 5, &NeverCancel, &mut buffer).unwrap();
/// assert_eq!(copied, 5);
/// assert_eq!(output, b"hello");
/// ```
#[derive(Debug)]
pub struct CopyBuffer {
    #[allow(clippy::large_stack_arrays)]
    buf: [u8; COPY_BUFFER_SIZE],
}

impl CopyBuffer {
    /// Creates a new zeroed copy buffer.
    #[inline]
    #[must_use]
    #[allow(clippy::large_stack_arrays)]
    pub fn new() -> Self {
        Self {
            buf: [0u8; COPY_BUFFER_SIZE],
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        COPY_BUFFER_SIZE
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A copy that stopped early, with the number of bytes already written.
#[derive(Debug)]
pub struct PartialCopy {
    /// Bytes that reached the writer before the failure.
    pub bytes_written: u64,
    /// Why the copy stopped.
    pub error: ExtractionError,
}

impl From<PartialCopy> for ExtractionError {
    fn from(partial: PartialCopy) -> Self {
        partial.error
    }
}

/// Copies at most `max_bytes` from `reader` to `writer`.
///
/// Reaching end of input before `max_bytes` is not an error; the caller
/// compares the returned count against what it expected. Interrupted reads
/// and writes are retried.
///
/// # Errors
///
/// Returns a [`PartialCopy`] carrying the bytes written so far when:
/// - the token reports cancellation ([`ExtractionError::Cancelled`])
/// - reading fails
/// - writing fails, or the writer accepts fewer bytes than offered
///   (`WriteZero`)
pub fn copy_with_cancel<W, R>(
    writer: &mut W,
    reader: &mut R,
    max_bytes: u64,
    cancel: &dyn CancellationToken,
    buffer: &mut CopyBuffer,
) -> Result<u64, PartialCopy>
where
    W: Write + ?Sized,
    R: Read + ?Sized,
{
    let mut written: u64 = 0;
    let mut chunks: usize = 0;

    let fail = |bytes_written, error| PartialCopy {
        bytes_written,
        error,
    };

    while written < max_bytes {
        if chunks.is_multiple_of(CANCEL_CHECK_INTERVAL) && cancel.is_cancelled() {
            return Err(fail(written, ExtractionError::Cancelled));
        }
        chunks = chunks.wrapping_add(1);

        let remaining = max_bytes - written;
        #[allow(clippy::cast_possible_truncation)]
        let want = remaining.min(COPY_BUFFER_SIZE as u64) as usize;

        let n = match reader.read(&mut buffer.buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(written, ExtractionError::Io(e))),
        };

        let accepted = loop {
            match writer.write(&buffer.buf[..n]) {
                Ok(accepted) => break accepted,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(fail(written, ExtractionError::Io(e))),
            }
        };
        written += accepted as u64;

        if accepted != n {
            return Err(fail(
                written,
                ExtractionError::Io(io::Error::new(io::ErrorKind::WriteZero, "short write")),
            ));
        }
    }

    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::NeverCancel;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_copy_buffer_new() {
        let buffer = CopyBuffer::new();
        assert_eq!(buffer.size(), 32 * 1024);
    }

    #[test]
    fn test_copy_empty_source() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(Vec::<u8>::new());
        let mut output = Vec::new();

        let copied = copy_with_cancel(&mut output, &mut input, 100, &NeverCancel, &mut buffer);
        assert_eq!(copied.unwrap(), 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_copy_stops_at_limit() {
        let mut buffer = CopyBuffer::new();
        let input_data = vec![0x42u8; COPY_BUFFER_SIZE * 3 + 1000];
        let mut input = Cursor::new(&input_data);
        let mut output = Vec::new();

        let limit = (COPY_BUFFER_SIZE * 2 + 17) as u64;
        let copied = copy_with_cancel(&mut output, &mut input, limit, &NeverCancel, &mut buffer);
        assert_eq!(copied.unwrap(), limit);
        assert_eq!(output.len() as u64, limit);

        // The rest of the source is untouched
        let mut rest = Vec::new();
        input.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len() as u64, input_data.len() as u64 - limit);
    }

    #[test]
    fn test_copy_short_source_is_not_an_error() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(b"short".to_vec());
        let mut output = Vec::new();

        let copied = copy_with_cancel(&mut output, &mut input, 1000, &NeverCancel, &mut buffer);
        assert_eq!(copied.unwrap(), 5);
        assert_eq!(output, b"short");
    }

    #[test]
    fn test_copy_zero_limit_reads_nothing() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(b"data".to_vec());
        let mut output = Vec::new();

        let copied = copy_with_cancel(&mut output, &mut input, 0, &NeverCancel, &mut buffer);
        assert_eq!(copied.unwrap(), 0);
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_copy_byte_for_byte_correctness() {
        let mut buffer = CopyBuffer::new();
        let mut input_data = Vec::new();
        for i in 0..=255u8 {
            input_data.extend_from_slice(&[i; 256]);
        }

        let mut input = Cursor::new(&input_data);
        let mut output = Vec::new();

        let copied = copy_with_cancel(
            &mut output,
            &mut input,
            u64::MAX,
            &NeverCancel,
            &mut buffer,
        );
        assert_eq!(copied.unwrap(), input_data.len() as u64);
        assert_eq!(output, input_data);
    }

    #[test]
    fn test_copy_cancelled_before_first_chunk() {
        let mut buffer = CopyBuffer::new();
        let mut input = Cursor::new(vec![1u8; 1024]);
        let mut output = Vec::new();
        let cancel = AtomicBool::new(true);

        let err = copy_with_cancel(&mut output, &mut input, 1024, &cancel, &mut buffer).unwrap_err();
        assert_eq!(err.bytes_written, 0);
        assert!(err.error.is_cancelled());
        assert!(output.is_empty());
    }

    // Fires after a fixed number of polls.
    struct CancelAfter {
        polls: AtomicUsize,
        limit: usize,
    }

    impl CancellationToken for CancelAfter {
        fn is_cancelled(&self) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) >= self.limit
        }
    }

    #[test]
    fn test_copy_polls_every_interval() {
        let mut buffer = CopyBuffer::new();
        let input_data = vec![7u8; COPY_BUFFER_SIZE * 25];
        let mut input = Cursor::new(&input_data);
        let mut output = Vec::new();
        let cancel = CancelAfter {
            polls: AtomicUsize::new(0),
            limit: 1,
        };

        let err = copy_with_cancel(&mut output, &mut input, u64::MAX, &cancel, &mut buffer)
            .unwrap_err();
        assert!(err.error.is_cancelled());
        // First poll passes, second poll happens after ten chunks
        assert_eq!(err.bytes_written, (COPY_BUFFER_SIZE * CANCEL_CHECK_INTERVAL) as u64);
        assert_eq!(output.len() as u64, err.bytes_written);
    }

    #[test]
    fn test_copy_with_interrupted_reads() {
        use std::io::Error;
        use std::io::ErrorKind;

        struct InterruptedReader {
            data: Vec<u8>,
            position: usize,
            calls: usize,
        }

        impl Read for InterruptedReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                self.calls += 1;
                if self.calls % 3 == 1 && self.position < self.data.len() {
                    return Err(Error::new(ErrorKind::Interrupted, "interrupted"));
                }
                let remaining = self.data.len() - self.position;
                let n = remaining.min(buf.len()).min(100);
                buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
                self.position += n;
                Ok(n)
            }
        }

        let test_data = vec![0x42u8; 1000];
        let mut reader = InterruptedReader {
            data: test_data.clone(),
            position: 0,
            calls: 0,
        };

        let mut buffer = CopyBuffer::new();
        let mut output = Vec::new();

        let copied = copy_with_cancel(&mut output, &mut reader, 1000, &NeverCancel, &mut buffer);
        assert_eq!(copied.unwrap(), 1000);
        assert_eq!(output, test_data);
    }

    #[test]
    fn test_copy_short_write_is_an_error() {
        struct HalfWriter(Vec<u8>);

        impl Write for HalfWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                let n = buf.len().div_ceil(2);
                self.0.extend_from_slice(&buf[..n]);
                Ok(n)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut input = Cursor::new(vec![0x42u8; 1000]);
        let mut writer = HalfWriter(Vec::new());
        let mut buffer = CopyBuffer::new();

        let err = copy_with_cancel(&mut writer, &mut input, 1000, &NeverCancel, &mut buffer)
            .unwrap_err();
        assert_eq!(err.bytes_written, 500);
        match err.error {
            ExtractionError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::WriteZero),
            other => panic!("expected short write, got {other:?}"),
        }
    }

    #[test]
    fn test_copy_write_failure_propagates() {
        struct FailingWriter;

        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("write failed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut input = Cursor::new(vec![0u8; 10]);
        let mut buffer = CopyBuffer::new();
        let err = copy_with_cancel(&mut FailingWriter, &mut input, 10, &NeverCancel, &mut buffer)
            .unwrap_err();
        assert_eq!(err.bytes_written, 0);
        assert!(matches!(err.error, ExtractionError::Io(_)));
    }
}
