//! 1bpp off-screen frame.
//!
//! The frame is 32 byte columns by 192 lines, most significant bit leftmost.
//! Sprites are combined with AND-then-OR per byte, so a sprite can punch an
//! opaque hole into what is behind it and still leave transparent pixels.

use crate::sprites::Sprite;

/// Bytes per line.
pub const FRAME_COLUMNS: usize = 32;

/// Lines per frame.
pub const FRAME_LINES: usize = 192;

/// Pixels per line.
pub const FRAME_WIDTH: usize = FRAME_COLUMNS * 8;

/// Monochrome frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    bytes: Vec<u8>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// Blank frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: vec![0; FRAME_COLUMNS * FRAME_LINES],
        }
    }

    /// Blank every pixel.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Raw bytes, line by line.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One line of bytes.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&[u8]> {
        let start = line.checked_mul(FRAME_COLUMNS)?;
        self.bytes.get(start..start + FRAME_COLUMNS)
    }

    /// Byte at a column and line; `None` outside the frame.
    #[must_use]
    pub fn byte(&self, column: i16, line: i16) -> Option<u8> {
        Self::index(column, line).map(|i| self.bytes[i])
    }

    /// Whether a pixel is set.
    #[must_use]
    pub fn pixel(&self, x: usize, line: usize) -> bool {
        if x >= FRAME_WIDTH || line >= FRAME_LINES {
            return false;
        }
        self.bytes[line * FRAME_COLUMNS + x / 8] & (0x80 >> (x % 8)) != 0
    }

    /// Number of set pixels.
    #[must_use]
    pub fn ink_count(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    fn index(column: i16, line: i16) -> Option<usize> {
        let column = usize::try_from(column).ok()?;
        let line = usize::try_from(line).ok()?;
        (column < FRAME_COLUMNS && line < FRAME_LINES).then_some(line * FRAME_COLUMNS + column)
    }

    /// Draw a sprite with its bottom row on `baseline`.
    ///
    /// Rows and byte columns falling outside the frame are clipped.
    pub fn blit(&mut self, sprite: &Sprite, column: i16, baseline: i16) {
        let height = sprite.height() as i16;
        let top = baseline - height + 1;
        for row in 0..sprite.height() {
            let line = top + row as i16;
            for byte in 0..sprite.width() {
                let Some(index) = Self::index(column + byte as i16, line) else {
                    continue;
                };
                let (mask, data) = sprite.at(byte, row);
                self.bytes[index] = (self.bytes[index] & mask) | data;
            }
        }
    }
}
