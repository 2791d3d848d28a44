//! Feature preprocessing
//!
//! Label one-hot encoding, categorical encoding, sequence pooling and
//! column-wise concatenation of feature blocks.

pub mod encoder;
pub mod features;
pub mod text;

pub use encoder::{argmax_rows, one_hot, CategoryEncoder};
pub use features::{concat_columns, mean_pool, stack_rows};
pub use text::{TextTokenizer, Vocabulary};
