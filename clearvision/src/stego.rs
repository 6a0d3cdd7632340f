//! End-anchored LSB message hiding.
//!
//! A bit stream of length `n` occupies the last `n` pixels of a grid in
//! row-major order, one bit per pixel LSB, so the final bit always lands on
//! the bottom-right pixel. No length header is written: the reader must
//! know the message length in characters.

use log::debug;

use crate::bits::{self, BitSequence, BITS_PER_CHAR};
use crate::error::StegoError;
use crate::grid::PixelGrid;
use crate::triangular::TriangularPair;

/// Write `bits` into the LSBs of a copy of `grid`, ending at its last pixel.
///
/// The input grid is left untouched.
pub fn embed(grid: &PixelGrid, bits: &BitSequence) -> Result<PixelGrid, StegoError> {
    let start = bits::start_position(grid.width(), grid.height(), bits.len())?;
    debug!(
        "embedding {} bits at index {} (row {}, col {})",
        bits.len(),
        start.index,
        start.row,
        start.col
    );

    let mut out = grid.clone();
    for (px, bit) in out.as_mut_slice()[start.index..].iter_mut().zip(bits.iter()) {
        *px = (*px & !1) | bit as u8;
    }
    Ok(out)
}

/// Read the LSBs of the last `message_len * 7` pixels of `grid`.
pub fn extract(grid: &PixelGrid, message_len: usize) -> Result<BitSequence, StegoError> {
    let bit_count = message_len
        .checked_mul(BITS_PER_CHAR)
        .ok_or(StegoError::Capacity {
            required: usize::MAX,
            available: grid.capacity(),
        })?;
    let start = bits::start_position(grid.width(), grid.height(), bit_count)?;
    debug!(
        "extracting {bit_count} bits from index {} (row {}, col {})",
        start.index, start.row, start.col
    );

    Ok(grid.as_slice()[start.index..]
        .iter()
        .map(|&px| px & 1 == 1)
        .collect())
}

/// Hide `message` in `grid` and return the result in triangular form.
pub fn hide_message(grid: &PixelGrid, message: &str) -> Result<TriangularPair, StegoError> {
    let encoded = bits::text_to_bits(message)?;
    let stego = embed(grid, &encoded)?;
    Ok(TriangularPair::split(&stego))
}

/// Recover a `message_len`-character message from a triangular pair.
pub fn reveal_message(pair: &TriangularPair, message_len: usize) -> Result<String, StegoError> {
    let grid = pair.reconstruct();
    let extracted = extract(&grid, message_len)?;
    bits::bits_to_text(&extracted)
}

/// Largest message, in characters, that fits in a `width`×`height` grid.
pub fn max_message_len(width: usize, height: usize) -> usize {
    width * height / BITS_PER_CHAR
}
