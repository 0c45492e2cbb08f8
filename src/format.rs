//! Prefix and message composition into the fixed scratch buffer.

use core::fmt;

/// A `fmt::Write` sink over a byte slice that drops whatever does not fit.
struct Truncating<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let n = room.min(s.len());
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        if n < s.len() {
            // Stop the formatter early, nothing else can be stored.
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

/// Longest prefix that still leaves room for the terminator in a buffer of `capacity`.
pub(crate) fn clamp_prefix(prefix: &[u8], capacity: usize) -> &[u8] {
    &prefix[..prefix.len().min(capacity.saturating_sub(1))]
}

/// Write `prefix` followed by `args` into `scratch` and return the length of the result.
///
/// The last byte of `scratch` is reserved for a zero terminator, so at most
/// `scratch.len() - 1` bytes are produced and the message is truncated to fit. The returned
/// length stops at the first zero byte, the terminator itself is never included.
///
/// `prefix` must already be clamped with [`clamp_prefix`].
pub(crate) fn compose(scratch: &mut [u8], prefix: &[u8], args: fmt::Arguments<'_>) -> usize {
    let Some(end) = scratch.len().checked_sub(1) else {
        return 0;
    };
    debug_assert!(prefix.len() <= end);

    scratch[..prefix.len()].copy_from_slice(prefix);

    let mut w = Truncating {
        buf: &mut scratch[prefix.len()..end],
        len: 0,
    };
    // Truncation surfaces as `fmt::Error`, which is expected here.
    let _ = fmt::write(&mut w, args);
    let written = prefix.len() + w.len;
    scratch[written] = 0;

    scratch[..written]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(written)
}
