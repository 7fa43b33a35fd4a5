use thiserror::Error;

#[derive(Debug, Error)]
pub enum CelSheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid frame #{index}: {width}x{height} (frames must have non-zero width and height)")]
    InvalidFrame { index: usize, width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Packing was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, CelSheetError>;
