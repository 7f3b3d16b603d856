use std::collections::TryReserveError;

/// Precomputed run of body characters, sliced by every bar draw.
///
/// Always holds exactly `width` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillBuffer {
    body: char,
    text: String,
    width: usize,
}

impl FillBuffer {
    pub fn new(body: char, width: usize) -> Self {
        Self {
            body,
            text: std::iter::repeat(body).take(width).collect(),
            width,
        }
    }

    /// Number of characters in the buffer
    pub fn width(&self) -> usize {
        self.width
    }

    /// The first `n` characters, or the whole buffer when `n` is larger.
    pub fn prefix(&self, n: usize) -> &str {
        if n >= self.width {
            return &self.text;
        }
        match self.text.char_indices().nth(n) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    /// Rebuilds the buffer for a new width.
    ///
    /// The allocation is fallible: on failure the buffer is left untouched so
    /// the caller can keep rendering with the previous width.
    pub fn resize(&mut self, width: usize) -> Result<(), TryReserveError> {
        if width == self.width {
            return Ok(());
        }
        let mut text = String::new();
        text.try_reserve_exact(width * self.body.len_utf8())?;
        text.extend(std::iter::repeat(self.body).take(width));
        self.text = text;
        self.width = width;
        Ok(())
    }

    /// Drops the backing storage
    pub fn release(&mut self) {
        self.text = String::new();
        self.width = 0;
    }
}
