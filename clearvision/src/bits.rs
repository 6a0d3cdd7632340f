use crate::error::StegoError;

/// Bits carried per ASCII character.
pub const BITS_PER_CHAR: usize = 7;

/// An ordered sequence of single bits.
///
/// A decodable message holds a multiple of [`BITS_PER_CHAR`] bits, each
/// character most-significant-bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSequence {
    bits: Vec<bool>,
}

impl BitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

impl FromIterator<bool> for BitSequence {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<bool>> for BitSequence {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

/// Encode an ASCII message as 7 bits per character, MSB first.
pub fn text_to_bits(message: &str) -> Result<BitSequence, StegoError> {
    let mut bits = BitSequence {
        bits: Vec::with_capacity(message.len() * BITS_PER_CHAR),
    };
    for (index, ch) in message.chars().enumerate() {
        if !ch.is_ascii() {
            return Err(StegoError::NonAscii { index, ch });
        }
        let code = ch as u8;
        for shift in (0..BITS_PER_CHAR).rev() {
            bits.push((code >> shift) & 1 == 1);
        }
    }
    Ok(bits)
}

/// Decode 7-bit MSB-first chunks back into text.
pub fn bits_to_text(bits: &BitSequence) -> Result<String, StegoError> {
    if bits.len() % BITS_PER_CHAR != 0 {
        return Err(StegoError::InvalidLength(bits.len()));
    }
    Ok(bits
        .as_slice()
        .chunks_exact(BITS_PER_CHAR)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8) as char)
        .collect())
}

/// Where a bit stream starts so that its last bit lands on the last pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartPosition {
    /// Row-major linear pixel index of the first bit.
    pub index: usize,
    pub row: usize,
    pub col: usize,
}

/// Compute the end-anchored start position for `bit_count` bits in a
/// `width`×`height` grid.
///
/// Fails with [`StegoError::Capacity`] when the bits outnumber the pixels.
pub fn start_position(width: usize, height: usize, bit_count: usize) -> Result<StartPosition, StegoError> {
    let available = width * height;
    if bit_count > available {
        return Err(StegoError::Capacity {
            required: bit_count,
            available,
        });
    }
    let index = available - bit_count;
    // An empty stream on an empty grid starts at index 0; there is no row to name.
    let (row, col) = if width == 0 { (0, 0) } else { (index / width, index % width) };
    Ok(StartPosition { index, row, col })
}
