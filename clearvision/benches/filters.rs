use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clearvision::filter;
use clearvision::grid::PixelGrid;
use clearvision::triangular::TriangularPair;

fn test_grid() -> PixelGrid {
    let (w, h) = (256, 256);
    let buf = (0..w * h).map(|i| ((i * 31) ^ (i >> 8)) as u8).collect();
    PixelGrid::from_buf(w, h, buf).expect("buffer matches dimensions")
}

fn bench_filters(c: &mut Criterion) {
    let grid = test_grid();

    c.bench_function("mean_filter_k5", |b| {
        b.iter(|| {
            let mut g = grid.clone();
            filter::mean_filter(&mut g, 5).unwrap();
            black_box(g)
        })
    });

    c.bench_function("gaussian_smoothing_k5", |b| {
        b.iter(|| {
            let mut g = grid.clone();
            filter::gaussian_smoothing(&mut g, 5, 1.0).unwrap();
            black_box(g)
        })
    });

    c.bench_function("unsharp_mask_k5", |b| {
        b.iter(|| {
            let mut g = grid.clone();
            filter::unsharp_mask(&mut g, 5, 1.5).unwrap();
            black_box(g)
        })
    });
}

fn bench_triangular(c: &mut Criterion) {
    let grid = test_grid();
    let pair = TriangularPair::split(&grid);

    c.bench_function("split_256", |b| b.iter(|| black_box(TriangularPair::split(&grid))));
    c.bench_function("reconstruct_256", |b| b.iter(|| black_box(pair.reconstruct())));
}

criterion_group!(benches, bench_filters, bench_triangular);
criterion_main!(benches);
