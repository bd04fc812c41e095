//! MSB-first bit reader with Exp-Golomb support.
//!
//! Just enough of ITU-T H.264 clause 9.1 to walk an SPS header. All reads
//! return `None` past the end of input so callers can bail out of a
//! truncated or corrupt header without partial results.

/// Reads bits most-significant-first from a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, byte: 0, bit: 0 }
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Option<u32> {
        let byte = *self.data.get(self.byte)?;
        let bit = (byte >> (7 - self.bit)) & 1;

        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }

        Some(bit as u32)
    }

    /// Read `count` bits (at most 32) as an unsigned big-endian value.
    pub fn read_bits(&mut self, count: u32) -> Option<u32> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()?;
        }
        Some(value)
    }

    /// Read an unsigned Exp-Golomb code (`ue(v)`).
    pub fn read_ue(&mut self) -> Option<u32> {
        let mut zeros = 0u32;
        while self.read_bit()? == 0 {
            zeros += 1;
            // A leading-zero run this long cannot occur in a valid header.
            if zeros > 31 {
                return None;
            }
        }

        if zeros == 0 {
            return Some(0);
        }

        let suffix = self.read_bits(zeros)?;
        Some((1u32 << zeros) - 1 + suffix)
    }

    /// Read a signed Exp-Golomb code (`se(v)`).
    pub fn read_se(&mut self) -> Option<i32> {
        let code = self.read_ue()?;
        if code & 1 == 1 {
            Some(((code >> 1) + 1) as i32)
        } else {
            Some(-((code >> 1) as i32))
        }
    }
}

/// Test-only counterpart of [`BitReader`]: builds bitstreams for parser
/// tests, including synthetic SPS headers.
#[cfg(test)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bit: u8,
}

#[cfg(test)]
impl BitWriter {
    pub fn new() -> Self {
        Self { bytes: Vec::new(), bit: 0 }
    }

    pub fn put_bit(&mut self, bit: u32) {
        if self.bit == 0 {
            self.bytes.push(0);
        }
        if bit != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.bit);
        }
        self.bit = (self.bit + 1) % 8;
    }

    pub fn put_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.put_bit((value >> i) & 1);
        }
    }

    pub fn put_ue(&mut self, value: u32) {
        let code = value + 1;
        let width = 32 - code.leading_zeros();
        self.put_bits(0, width - 1);
        self.put_bits(code, width);
    }

    pub fn put_se(&mut self, value: i32) {
        let code = if value > 0 {
            (value as u32) * 2 - 1
        } else {
            (-value as u32) * 2
        };
        self.put_ue(code);
    }

    /// Append RBSP trailing bits (stop bit + zero padding) and return the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.put_bit(1);
        while self.bit != 0 {
            self.put_bit(0);
        }
        self.bytes
    }
}
