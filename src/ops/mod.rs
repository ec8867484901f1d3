// Operation enums and their backward rules
pub mod binary;
pub mod loss;
pub mod reduce;
pub mod unary;

pub use binary::{BinaryGradFn, BinaryOp};
pub use loss::{CrossEntropyGradFn, MseGradFn};
pub use reduce::{MeanGradFn, ReduceOp, SumGradFn};
pub use unary::{UnaryGradFn, UnaryOp};
