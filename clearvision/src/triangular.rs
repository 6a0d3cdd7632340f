//! Triangular split storage for pixel grids.
//!
//! A grid is partitioned into an upper part (`col >= row`, diagonal
//! included) and a strictly lower part (`col < row`). Both parts are flat
//! vectors filled in row-major, column-ascending order, which makes the
//! split a lossless bijection with the grid.
//!
//! On disk a pair is three newline-terminated text lines:
//!
//! ```text
//! <width> <height>
//! <upper[0]> <upper[1]> ... <upper[U-1]>
//! <lower[0]> <lower[1]> ... <lower[L-1]>
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::FormatError;
use crate::grid::PixelGrid;

/// Number of cells with `col >= row` in a `width`×`height` grid, or `None`
/// when the grid is too large to address.
///
/// For square grids this is `h * (h + 1) / 2`.
pub fn upper_len(width: usize, height: usize) -> Option<usize> {
    // each of the first m rows holds (width - row) upper cells
    let m = width.min(height);
    let full = m.checked_mul(width)?;
    let missing = if m == 0 { 0 } else { m * (m - 1) / 2 };
    Some(full - missing)
}

/// Number of cells with `col < row` in a `width`×`height` grid, or `None`
/// when the grid is too large to address.
///
/// For square grids this is `h * (h - 1) / 2`.
pub fn lower_len(width: usize, height: usize) -> Option<usize> {
    Some(width.checked_mul(height)? - upper_len(width, height)?)
}

/// The upper and lower triangular parts of a pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangularPair {
    width: usize,
    height: usize,
    upper: Vec<u8>,
    lower: Vec<u8>,
}

impl TriangularPair {
    /// Split a grid into its triangular parts.
    pub fn split(grid: &PixelGrid) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let mut upper = Vec::with_capacity(upper_len(width, height).unwrap_or_default());
        let mut lower = Vec::with_capacity(lower_len(width, height).unwrap_or_default());
        fill_parts(grid, &mut upper, &mut lower);
        debug!(
            "split {width}x{height} grid into {} upper / {} lower samples",
            upper.len(),
            lower.len()
        );
        Self {
            width,
            height,
            upper,
            lower,
        }
    }

    /// Assemble a pair from previously split parts, checking their sizes.
    pub fn from_parts(
        width: usize,
        height: usize,
        upper: Vec<u8>,
        lower: Vec<u8>,
    ) -> Result<Self, FormatError> {
        let too_large =
            || FormatError::InvalidHeader(format!("{width}x{height} grid is too large"));
        let expected_upper = upper_len(width, height).ok_or_else(too_large)?;
        let expected_lower = lower_len(width, height).ok_or_else(too_large)?;
        check_count("upper", expected_upper, upper.len())?;
        check_count("lower", expected_lower, lower.len())?;
        Ok(Self {
            width,
            height,
            upper,
            lower,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn upper(&self) -> &[u8] {
        &self.upper
    }

    pub fn lower(&self) -> &[u8] {
        &self.lower
    }

    /// Rebuild the full grid, pulling each cell from the part it was split into.
    pub fn reconstruct(&self) -> PixelGrid {
        debug!("reconstructing {}x{} grid", self.width, self.height);
        let mut grid = PixelGrid::new(self.width, self.height);
        let w = self.width;
        let mut up = 0;
        let mut low = 0;
        for (row, dst) in grid.as_mut_slice().chunks_exact_mut(w.max(1)).enumerate() {
            let split = row.min(w);
            dst[..split].copy_from_slice(&self.lower[low..low + split]);
            dst[split..].copy_from_slice(&self.upper[up..up + w - split]);
            low += split;
            up += w - split;
        }
        grid
    }

    /// Re-split an edited grid into this pair in place.
    ///
    /// The grid must have the same dimensions as the pair.
    pub fn store(&mut self, grid: &PixelGrid) -> Result<(), FormatError> {
        if grid.width() != self.width || grid.height() != self.height {
            return Err(FormatError::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                actual_w: grid.width(),
                actual_h: grid.height(),
            });
        }
        self.upper.clear();
        self.lower.clear();
        fill_parts(grid, &mut self.upper, &mut self.lower);
        Ok(())
    }

    /// Serialize the pair in the three-line text format.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), FormatError> {
        writeln!(out, "{} {}", self.width, self.height)?;
        out.write_all(join_samples(&self.upper).as_bytes())?;
        out.write_all(join_samples(&self.lower).as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Parse a pair from the three-line text format.
    ///
    /// Sample counts must match the sizes implied by the header exactly.
    pub fn read_from<R: BufRead>(input: R) -> Result<Self, FormatError> {
        let mut lines = input.lines();
        let mut next_line = |name: &'static str| -> Result<String, FormatError> {
            lines.next().ok_or(FormatError::MissingLine(name))?.map_err(FormatError::from)
        };

        let header = next_line("header")?;
        let (width, height) = parse_header(&header)?;
        let upper = parse_samples("upper", &next_line("upper")?)?;
        let lower = parse_samples("lower", &next_line("lower")?)?;

        for rest in lines {
            if !rest?.trim().is_empty() {
                return Err(FormatError::TrailingData);
            }
        }

        Self::from_parts(width, height, upper, lower)
    }

    /// Write the pair to `path`, creating or truncating the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FormatError> {
        let path = path.as_ref();
        debug!("saving {}x{} pair to {}", self.width, self.height, path.display());
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Read a pair from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        debug!("loading pair from {}", path.display());
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

fn fill_parts(grid: &PixelGrid, upper: &mut Vec<u8>, lower: &mut Vec<u8>) {
    let w = grid.width();
    for (row, src) in grid.as_slice().chunks_exact(w.max(1)).enumerate() {
        let split = row.min(w);
        lower.extend_from_slice(&src[..split]);
        upper.extend_from_slice(&src[split..]);
    }
}

fn check_count(line: &'static str, expected: usize, actual: usize) -> Result<(), FormatError> {
    if expected != actual {
        return Err(FormatError::CountMismatch {
            line,
            expected,
            actual,
        });
    }
    Ok(())
}

fn join_samples(samples: &[u8]) -> String {
    let mut line = samples
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    line.push('\n');
    line
}

fn parse_header(line: &str) -> Result<(usize, usize), FormatError> {
    let mut tokens = line.split_whitespace();
    let mut dim = |name: &str| -> Result<usize, FormatError> {
        tokens
            .next()
            .ok_or_else(|| FormatError::InvalidHeader(format!("missing {name}")))?
            .parse()
            .map_err(|_| FormatError::InvalidHeader(format!("bad {name} in '{line}'")))
    };
    let width = dim("width")?;
    let height = dim("height")?;
    if tokens.next().is_some() {
        return Err(FormatError::InvalidHeader(format!("extra tokens in '{line}'")));
    }
    Ok((width, height))
}

fn parse_samples(line: &'static str, text: &str) -> Result<Vec<u8>, FormatError> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<u8>().map_err(|_| FormatError::InvalidValue {
                line,
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_grid(width: usize, height: usize) -> PixelGrid {
        let buf = (0..width * height).map(|i| (i % 256) as u8).collect();
        PixelGrid::from_buf(width, height, buf).unwrap()
    }

    #[test]
    fn square_sizes_match_triangle_formulas() {
        for h in 0..12 {
            assert_eq!(upper_len(h, h), Some(h * (h + 1) / 2));
            assert_eq!(lower_len(h, h), Some(h * h.saturating_sub(1) / 2));
        }
    }

    #[test]
    fn non_square_sizes_cover_every_cell() {
        // 4 wide, 2 tall: row 0 -> 4 upper, row 1 -> 3 upper + 1 lower
        assert_eq!(upper_len(4, 2), Some(7));
        assert_eq!(lower_len(4, 2), Some(1));
        // 2 wide, 4 tall: rows 2 and 3 are entirely lower
        assert_eq!(upper_len(2, 4), Some(3));
        assert_eq!(lower_len(2, 4), Some(5));
    }

    #[test]
    fn sizes_of_unaddressable_grid_are_none() {
        assert_eq!(upper_len(usize::MAX, 2), None);
        assert_eq!(lower_len(1 << 32, 1 << 32), None);
        // a single row of any width is all upper
        assert_eq!(upper_len(usize::MAX, 1), Some(usize::MAX));
        assert_eq!(lower_len(usize::MAX, 1), Some(0));
    }

    #[test]
    fn split_3x3_orders_row_major() {
        // 0 1 2
        // 3 4 5
        // 6 7 8
        let pair = TriangularPair::split(&counting_grid(3, 3));
        assert_eq!(pair.upper(), &[0, 1, 2, 4, 5, 8]);
        assert_eq!(pair.lower(), &[3, 6, 7]);
    }

    #[test]
    fn reconstruct_inverts_split() {
        for (w, h) in [(1, 1), (3, 3), (10, 10), (7, 3), (3, 7), (0, 4), (5, 0)] {
            let grid = counting_grid(w, h);
            let pair = TriangularPair::split(&grid);
            assert_eq!(pair.reconstruct(), grid, "{w}x{h}");
        }
    }

    #[test]
    fn store_updates_parts_in_place() {
        let grid = counting_grid(3, 3);
        let mut pair = TriangularPair::split(&grid);
        let mut edited = grid.clone();
        edited.set(2, 0, 200);
        edited.set(1, 1, 100);
        pair.store(&edited).unwrap();
        assert_eq!(pair.lower(), &[3, 200, 7]);
        assert_eq!(pair.upper(), &[0, 1, 2, 100, 5, 8]);
        assert_eq!(pair.reconstruct(), edited);
    }

    #[test]
    fn store_rejects_other_dimensions() {
        let mut pair = TriangularPair::split(&counting_grid(3, 3));
        let err = pair.store(&counting_grid(4, 3)).unwrap_err();
        assert!(matches!(err, FormatError::DimensionMismatch { .. }));
    }

    #[test]
    fn from_parts_checks_sizes() {
        let err = TriangularPair::from_parts(3, 3, vec![0; 5], vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::CountMismatch {
                line: "upper",
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn write_to_produces_three_lines() {
        let pair = TriangularPair::split(&counting_grid(3, 3));
        let mut out = Vec::new();
        pair.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3 3\n0 1 2 4 5 8\n3 6 7\n");
    }

    #[test]
    fn single_pixel_has_empty_lower_line() {
        let pair = TriangularPair::split(&counting_grid(1, 1));
        let mut out = Vec::new();
        pair.write_to(&mut out).unwrap();
        assert_eq!(out, b"1 1\n0\n\n");
        assert_eq!(TriangularPair::read_from(&out[..]).unwrap(), pair);
    }

    #[test]
    fn read_from_parses_written_pair() {
        let pair = TriangularPair::split(&counting_grid(6, 6));
        let mut out = Vec::new();
        pair.write_to(&mut out).unwrap();
        assert_eq!(TriangularPair::read_from(&out[..]).unwrap(), pair);
    }

    #[test]
    fn read_from_rejects_short_upper() {
        let err = TriangularPair::read_from(&b"3 3\n0 1 2 4 5\n3 6 7\n"[..]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::CountMismatch {
                line: "upper",
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn read_from_rejects_long_lower() {
        let err = TriangularPair::read_from(&b"3 3\n0 1 2 4 5 8\n3 6 7 9\n"[..]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::CountMismatch {
                line: "lower",
                ..
            }
        ));
    }

    #[test]
    fn read_from_rejects_missing_lower_line() {
        let err = TriangularPair::read_from(&b"3 3\n0 1 2 4 5 8\n"[..]).unwrap_err();
        assert!(matches!(err, FormatError::MissingLine("lower")));
    }

    #[test]
    fn read_from_rejects_bad_header() {
        for text in ["3\n", "a 3\n", "3 3 3\n", "-1 2\n"] {
            let err = TriangularPair::read_from(text.as_bytes()).unwrap_err();
            assert!(matches!(err, FormatError::InvalidHeader(_)), "{text:?}");
        }
    }

    #[test]
    fn read_from_rejects_overflowing_header() {
        for header in [format!("{} 2", usize::MAX), format!("{0} {0}", 1u64 << 32)] {
            let text = format!("{header}\n1\n\n");
            let err = TriangularPair::read_from(text.as_bytes()).unwrap_err();
            assert!(matches!(err, FormatError::InvalidHeader(_)), "{header}");
        }
    }

    #[test]
    fn read_from_rejects_out_of_range_sample() {
        let err = TriangularPair::read_from(&b"1 1\n256\n\n"[..]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::InvalidValue { line: "upper", .. }
        ));
    }

    #[test]
    fn read_from_rejects_trailing_data() {
        let err = TriangularPair::read_from(&b"1 1\n5\n\n7\n"[..]).unwrap_err();
        assert!(matches!(err, FormatError::TrailingData));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TriangularPair::load(dir.path().join("absent.tri")).unwrap_err();
        assert!(matches!(err, FormatError::Io(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.tri");
        let pair = TriangularPair::split(&counting_grid(5, 5));
        pair.save(&path).unwrap();
        assert_eq!(TriangularPair::load(&path).unwrap(), pair);
    }
}
