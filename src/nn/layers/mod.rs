pub mod affine;
pub mod relu;
pub mod sequential;

pub use affine::Affine;
pub use relu::ReLU;
pub use sequential::Sequential;
