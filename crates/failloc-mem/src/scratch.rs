//! Bounded formatting sink shared by the location cache and the formatter.
//!
//! [`Probe`] behaves like `snprintf` into a fixed buffer: it keeps at most
//! `buf.len() - 1` bytes (the last byte is reserved for a terminator) and
//! keeps counting the full length the output would have needed. Truncation
//! is not an error. Kept output is always a valid UTF-8 prefix: a piece that
//! does not fit is cut back to a character boundary and everything after it
//! is dropped.

use std::fmt;

/// A `fmt::Write` sink over a borrowed byte buffer.
pub(crate) struct Probe<'a> {
    buf: &'a mut [u8],
    len: usize,
    required: usize,
    truncated: bool,
}

impl<'a> Probe<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            required: 0,
            truncated: false,
        }
    }

    /// Bytes the full output needed, kept or not.
    pub(crate) fn required(&self) -> usize {
        self.required
    }

    /// The kept prefix.
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: only whole `&str` pieces or prefixes cut at a char
        // boundary are ever copied into `buf[..len]`.
        unsafe { std::str::from_utf8_unchecked(&self.buf[..self.len]) }
    }

    fn room(&self) -> usize {
        self.buf.len().saturating_sub(1).saturating_sub(self.len)
    }
}

impl fmt::Write for Probe<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.required = self.required.saturating_add(s.len());
        if self.truncated {
            return Ok(());
        }

        let mut take = s.len().min(self.room());
        if take < s.len() {
            self.truncated = true;
            while !s.is_char_boundary(take) {
                take -= 1;
            }
        }

        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}
