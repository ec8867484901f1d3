use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradError {
    #[error("Shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    #[error("Size mismatch in {op}: {expected} elements vs {actual}")]
    SizeMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Division by zero: divisor element {index} is 0")]
    DivisionByZero { index: usize },

    #[error("Cannot reduce an empty tensor in {op}")]
    EmptyTensor { op: &'static str },

    #[error("Batch mismatch: predictions have {predictions} rows but targets have {targets}")]
    BatchMismatch { predictions: usize, targets: usize },

    #[error("Invalid class index {index} for sample {sample} ({num_classes} classes)")]
    InvalidClassIndex {
        sample: usize,
        index: f64,
        num_classes: usize,
    },

    #[error("Non-positive probability {value} selected for sample {sample}")]
    NonPositiveProbability { sample: usize, value: f64 },

    #[error(
        "Backward requires a scalar tensor that tracks gradients (shape {shape:?}, requires_grad={requires_grad})"
    )]
    UngradedBackward {
        shape: Vec<usize>,
        requires_grad: bool,
    },

    #[error("Index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("State dict error: {0}")]
    StateDict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode state dict: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode state dict: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, GradError>;
