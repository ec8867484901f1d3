pub mod dataset;
pub mod loader;

pub use dataset::{Dataset, TensorDataset};
pub use loader::{Batch, DataLoader};
