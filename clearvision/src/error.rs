use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions differ: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("pixel buffer holds {actual} samples, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Errors reading, writing, or assembling a triangular pair.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing {0} line")]
    MissingLine(&'static str),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid sample '{token}' on {line} line")]
    InvalidValue { line: &'static str, token: String },

    #[error("{line} line holds {actual} samples, expected {expected}")]
    CountMismatch {
        line: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unexpected data after lower line")]
    TrailingData,

    #[error("grid is {actual_w}x{actual_h} but pair is {expected_w}x{expected_h}")]
    DimensionMismatch {
        expected_w: usize,
        expected_h: usize,
        actual_w: usize,
        actual_h: usize,
    },
}

#[derive(Debug, Error)]
pub enum StegoError {
    #[error("not enough pixels: need {required} bits, grid holds {available}")]
    Capacity { required: usize, available: usize },

    #[error("bit sequence length {0} is not a multiple of 7")]
    InvalidLength(usize),

    #[error("character {ch:?} at position {index} is not 7-bit ASCII")]
    NonAscii { index: usize, ch: char },

    #[error("triangular pair: {0}")]
    Format(#[from] FormatError),
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("kernel size {0} must be odd and at least 1")]
    InvalidKernelSize(usize),

    #[error("sigma {0} must be finite and positive")]
    InvalidSigma(f64),

    #[error("unsharp amount {0} must be finite")]
    InvalidAmount(f64),

    #[error("pipeline config error: {0}")]
    Config(String),
}
