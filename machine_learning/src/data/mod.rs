mod dataloader;
mod dataset;
mod one_hot;

pub use dataloader::{Batch, BatchSource, DataLoader};
pub use dataset::Dataset;
pub use one_hot::one_hot;
