//! Sliding-window convolution filters.
//!
//! Every filter reads from a snapshot of the input and writes the result
//! back into the caller's grid. Window cells that fall outside the grid
//! contribute 0 (zero padding), so borders darken rather than clamp to the
//! edge value.

#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
#[cfg(feature = "parallel")]
use rayon::slice::ParallelSliceMut;

use log::debug;

use crate::error::FilterError;
use crate::grid::PixelGrid;

/// Sigma used for the blur step of [`unsharp_mask`].
pub const UNSHARP_SIGMA: f64 = 1.0;

/// Replace each pixel with the truncated mean of its `kernel_size`² window.
pub fn mean_filter(grid: &mut PixelGrid, kernel_size: usize) -> Result<(), FilterError> {
    check_kernel_size(kernel_size)?;
    debug!("mean filter k={kernel_size} on {}x{}", grid.width(), grid.height());

    let src = grid.clone();
    let area = (kernel_size * kernel_size) as u64;
    for_each_pixel(grid, |row, col| {
        let sum: u64 = window(&src, row, col, kernel_size)
            .map(|(_, v)| v as u64)
            .sum();
        (sum / area) as u8
    });
    Ok(())
}

/// Build a normalized `kernel_size`×`kernel_size` Gaussian kernel, row-major.
pub fn gaussian_kernel(kernel_size: usize, sigma: f64) -> Result<Vec<f64>, FilterError> {
    check_kernel_size(kernel_size)?;
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let half = (kernel_size / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let scale = 1.0 / (std::f64::consts::PI * two_sigma_sq);
    let mut kernel = Vec::with_capacity(kernel_size * kernel_size);
    for i in 0..kernel_size {
        for j in 0..kernel_size {
            let dy = i as f64 - half;
            let dx = j as f64 - half;
            kernel.push(scale * (-(dx * dx + dy * dy) / two_sigma_sq).exp());
        }
    }

    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    Ok(kernel)
}

/// Replace each pixel with the truncated Gaussian-weighted sum of its window.
pub fn gaussian_smoothing(
    grid: &mut PixelGrid,
    kernel_size: usize,
    sigma: f64,
) -> Result<(), FilterError> {
    let kernel = gaussian_kernel(kernel_size, sigma)?;
    debug!(
        "gaussian smoothing k={kernel_size} sigma={sigma} on {}x{}",
        grid.width(),
        grid.height()
    );

    let src = grid.clone();
    for_each_pixel(grid, |row, col| {
        let total: f64 = window(&src, row, col, kernel_size)
            .map(|(k, v)| v as f64 * kernel[k])
            .sum();
        total as u8
    });
    Ok(())
}

/// Sharpen by adding back `amount` times the difference from a Gaussian blur.
///
/// Each result is `original + amount * (original - blurred)`, truncated
/// toward zero and clamped to `0..=255`.
pub fn unsharp_mask(grid: &mut PixelGrid, kernel_size: usize, amount: f64) -> Result<(), FilterError> {
    if !amount.is_finite() {
        return Err(FilterError::InvalidAmount(amount));
    }
    let mut blurred = grid.clone();
    gaussian_smoothing(&mut blurred, kernel_size, UNSHARP_SIGMA)?;
    debug!("unsharp mask k={kernel_size} amount={amount}");

    let src = grid.clone();
    for_each_pixel(grid, |row, col| {
        let o = src.get(row, col) as i32;
        let b = blurred.get(row, col) as i32;
        let v = (o as f64 + amount * (o - b) as f64) as i32;
        v.clamp(0, 255) as u8
    });
    Ok(())
}

fn check_kernel_size(kernel_size: usize) -> Result<(), FilterError> {
    // the kernel must be addressable as kernel_size² cells
    if kernel_size % 2 == 0 || kernel_size.checked_mul(kernel_size).is_none() {
        return Err(FilterError::InvalidKernelSize(kernel_size));
    }
    Ok(())
}

/// In-bounds cells of the window centered on (`row`, `col`), as
/// (row-major kernel index, sample). Out-of-bounds cells are skipped,
/// which is the same as reading them as 0.
fn window(
    src: &PixelGrid,
    row: usize,
    col: usize,
    kernel_size: usize,
) -> impl Iterator<Item = (usize, u8)> + '_ {
    let half = (kernel_size / 2) as isize;
    let (row, col) = (row as isize, col as isize);
    (0..kernel_size).flat_map(move |ki| {
        (0..kernel_size).filter_map(move |kj| {
            let r = row - half + ki as isize;
            let c = col - half + kj as isize;
            if r < 0 || c < 0 {
                return None;
            }
            src.get_checked(r as usize, c as usize)
                .map(|v| (ki * kernel_size + kj, v))
        })
    })
}

/// Overwrite every pixel of `grid` with `f(row, col)`, row by row.
fn for_each_pixel<F>(grid: &mut PixelGrid, f: F)
where
    F: Fn(usize, usize) -> u8 + Sync,
{
    let w = grid.width();
    if w == 0 {
        return;
    }
    let fill_row = |(row, out): (usize, &mut [u8])| {
        for (col, px) in out.iter_mut().enumerate() {
            *px = f(row, col);
        }
    };

    #[cfg(feature = "parallel")]
    grid.as_mut_slice()
        .par_chunks_mut(w)
        .enumerate()
        .for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    grid.as_mut_slice()
        .chunks_mut(w)
        .enumerate()
        .for_each(fill_row);
}
