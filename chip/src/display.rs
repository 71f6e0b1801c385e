//! The logical monochrome frame buffer.
use crate::definitions::display;

/// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
/// `(64 x 32)`. Only the clear and the sprite blit operations change it, the presentation
/// layer reads it through [`DisplayCommands`](crate::devices::DisplayCommands).
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pixels: Box<[bool; display::RESOLUTION]>,
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; display::RESOLUTION]),
        }
    }
}

impl std::fmt::Debug for DisplayBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// XORs the sprite onto the buffer with its top left corner at `(x, y)`.
    ///
    /// Every byte of `sprite` is one row, the most significant bit being the left most pixel.
    /// Pixels leaving the screen wrap around to the opposite edge. Returns `true` if at least
    /// one pixel was turned from on to off.
    ///
    /// # Example
    /// ```rust
    /// # use chip::display::DisplayBuffer;
    /// let mut buffer = DisplayBuffer::new();
    /// assert!(!buffer.sprite_blit(62, 0, &[0b1100_0000]));
    /// assert!(buffer.pixel(63, 0) && buffer.pixel(62, 0));
    /// // the second call turns the same pixels off again
    /// assert!(buffer.sprite_blit(62, 0, &[0b1100_0000]));
    /// assert!(!buffer.pixel(63, 0));
    /// ```
    pub fn sprite_blit(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (i, row) in sprite.iter().enumerate() {
            let py = (y + i) % display::HEIGHT;

            for j in 0..display::SPRITE_WIDTH {
                let bit = (row >> (display::SPRITE_WIDTH - 1 - j)) & 1 == 1;
                if !bit {
                    continue;
                }

                let px = (x + j) % display::WIDTH;
                let pixel = &mut self.pixels[py * display::WIDTH + px];

                collision |= *pixel;
                *pixel = !*pixel;
            }
        }

        collision
    }

    /// Will return the state of the pixel at `(x, y)`, both coordinates wrap.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % display::HEIGHT) * display::WIDTH + (x % display::WIDTH)]
    }

    /// Will return an iterator over the rows, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks_exact(display::WIDTH)
    }

    /// Will return `true` if no pixel is turned on.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| !p)
    }
}
