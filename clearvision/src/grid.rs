use crate::error::GridError;

/// Grayscale pixel grid with row-major samples in `0..=255`.
///
/// Dimensions are fixed at construction. Cloning produces an independent
/// deep copy; equality compares dimensions and every sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    buf: Vec<u8>,
}

impl PixelGrid {
    /// Create a new grid filled with zeros.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buf: vec![0u8; width * height],
        }
    }

    /// Create a grid from decoded row-major samples.
    ///
    /// `buf` must contain exactly `width * height` samples.
    pub fn from_buf(width: usize, height: usize, buf: Vec<u8>) -> Result<Self, GridError> {
        if buf.len() != width * height {
            return Err(GridError::BufferSize {
                expected: width * height,
                actual: buf.len(),
            });
        }
        Ok(Self { width, height, buf })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels, which is also the LSB capacity in bits.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.width * self.height
    }

    /// Get the sample at (`row`, `col`). Panics when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.buf[self.index(row, col)]
    }

    /// Get the sample at (`row`, `col`), or `None` when out of bounds.
    pub fn get_checked(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            Some(self.buf[row * self.width + col])
        } else {
            None
        }
    }

    /// Set the sample at (`row`, `col`). Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: u8) {
        let i = self.index(row, col);
        self.buf[i] = val;
    }

    /// Row-major samples.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Consume the grid and return its row-major samples.
    pub fn into_raw(self) -> Vec<u8> {
        self.buf
    }

    /// Element-wise sum, each result clamped to 255.
    pub fn add(&self, other: &PixelGrid) -> Result<PixelGrid, GridError> {
        self.zip_with(other, |a, b| a.saturating_add(b))
    }

    /// Element-wise difference, each result clamped to 0.
    pub fn subtract(&self, other: &PixelGrid) -> Result<PixelGrid, GridError> {
        self.zip_with(other, |a, b| a.saturating_sub(b))
    }

    fn zip_with(&self, other: &PixelGrid, f: impl Fn(u8, u8) -> u8) -> Result<PixelGrid, GridError> {
        self.check_same_shape(other)?;
        let buf = self
            .buf
            .iter()
            .zip(&other.buf)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(PixelGrid {
            width: self.width,
            height: self.height,
            buf,
        })
    }

    fn check_same_shape(&self, other: &PixelGrid) -> Result<(), GridError> {
        if self.width != other.width || self.height != other.height {
            return Err(GridError::DimensionMismatch {
                left: (self.width, self.height),
                right: (other.width, other.height),
            });
        }
        Ok(())
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.height && col < self.width,
            "pixel ({row}, {col}) out of bounds for {}x{} grid",
            self.width,
            self.height
        );
        row * self.width + col
    }
}
