pub mod tensor;
pub mod shape;
pub mod error;
pub mod estimator;

pub use tensor::Tensor;
pub use shape::Shape;
pub use error::{TensorError, TensorResult};
pub use estimator::Estimator;
