//! Fixed-capacity circular sample buffers.
//!
//! A [`CircularBuffer`] always holds exactly `D` values (zero until written);
//! there is no full or empty state. The write cursor only ever increments and
//! is reduced with a bitmask, so `D` must be a power of two. This is checked
//! at compile time.
//!
//! # Read convention
//!
//! [`CircularBuffer::read`] indexes with `(cursor + !offset) & (D - 1)`. Since
//! `!offset == -offset - 1`, offset `0` is the most recent write and offset
//! `k` is the value written `k` writes before it. Consumers written against
//! the firmware's buffers rely on this exact formula.
//!
//! | Alias | Depth | Typical use |
//! |-------|-------|-------------|
//! | [`LilBuffer`] | 8 | dither counters, gate-hold windows |
//! | [`Buffer`] | 32 | CV smoothing, nudge history |
//! | [`LongBuffer`] | 256 | slow averaging |

/// Ring buffer of `D` `i32` values.
///
/// # Example
///
/// ```rust
/// use via_dsp::LilBuffer;
///
/// let mut history = LilBuffer::new();
/// history.write(10);
/// history.write(20);
/// assert_eq!(history.read(0), 20);
/// assert_eq!(history.read(1), 10);
/// ```
#[derive(Debug, Clone)]
pub struct CircularBuffer<const D: usize> {
    buff: [i32; D],
    cursor: usize,
}

/// Depth-8 buffer.
pub type LilBuffer = CircularBuffer<8>;
/// Depth-32 buffer.
pub type Buffer = CircularBuffer<32>;
/// Depth-256 buffer.
pub type LongBuffer = CircularBuffer<256>;

impl<const D: usize> CircularBuffer<D> {
    const MASK: usize = {
        assert!(D.is_power_of_two(), "circular buffer depth must be a power of two");
        D - 1
    };

    /// Zero-filled buffer with the cursor at 0.
    pub const fn new() -> Self {
        Self {
            buff: [0; D],
            cursor: 0,
        }
    }

    /// Buffer depth.
    pub const fn depth(&self) -> usize {
        D
    }

    /// Store `value` at the cursor and advance it.
    #[inline]
    pub fn write(&mut self, value: i32) {
        self.buff[self.cursor & Self::MASK] = value;
        self.cursor = self.cursor.wrapping_add(1);
    }

    /// Value written `offset` writes before the most recent one.
    ///
    /// Offsets wrap modulo `D`.
    #[inline]
    pub fn read(&self, offset: usize) -> i32 {
        self.buff[self.cursor.wrapping_add(!offset) & Self::MASK]
    }

    /// Overwrite the whole history with `value`.
    pub fn fill(&mut self, value: i32) {
        for _ in 0..D {
            self.write(value);
        }
    }

    /// Wrapping sum of the stored values.
    #[inline]
    pub fn sum(&self) -> i32 {
        self.buff.iter().fold(0_i32, |acc, &v| acc.wrapping_add(v))
    }

    /// Number of writes since construction, modulo the cursor width.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<const D: usize> Default for CircularBuffer<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let buffer = Buffer::new();
        for k in 0..32 {
            assert_eq!(buffer.read(k), 0);
        }
        assert_eq!(buffer.sum(), 0);
    }

    #[test]
    fn reads_most_recent_first() {
        let mut buffer = LilBuffer::new();
        for v in 1..=8 {
            buffer.write(v * 100);
        }
        let read: [i32; 8] = core::array::from_fn(|k| buffer.read(k));
        assert_eq!(read, [800, 700, 600, 500, 400, 300, 200, 100]);
    }

    #[test]
    fn offsets_wrap_modulo_depth() {
        let mut buffer = LilBuffer::new();
        for v in 0..8 {
            buffer.write(v);
        }
        assert_eq!(buffer.read(8), buffer.read(0));
        assert_eq!(buffer.read(11), buffer.read(3));
    }

    #[test]
    fn overwrites_oldest() {
        let mut buffer = LilBuffer::new();
        for v in 0..12 {
            buffer.write(v);
        }
        assert_eq!(buffer.read(0), 11);
        assert_eq!(buffer.read(7), 4);
    }

    #[test]
    fn fill_replaces_history() {
        let mut buffer = Buffer::new();
        buffer.write(5);
        buffer.fill(-3);
        assert_eq!(buffer.sum(), -3 * 32);
        assert_eq!(buffer.cursor(), 33);
    }

    #[test]
    fn long_buffer_depth() {
        let buffer = LongBuffer::default();
        assert_eq!(buffer.depth(), 256);
    }

    #[test]
    fn cursor_wraparound_keeps_indexing() {
        let mut buffer = LilBuffer {
            buff: [0; 8],
            cursor: usize::MAX - 2,
        };
        for v in 1..=6 {
            buffer.write(v);
        }
        assert_eq!(buffer.read(0), 6);
        assert_eq!(buffer.read(5), 1);
    }
}
