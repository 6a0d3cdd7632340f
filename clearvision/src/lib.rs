pub mod error;
pub mod grid;
pub mod triangular;
pub mod bits;
pub mod stego;
pub mod filter;
pub mod pipeline;
