pub mod layers;
pub mod sequential;
pub mod loss;
pub mod optim;
pub mod scaler;
pub mod regressor;

pub use layers::*;
pub use sequential::*;
pub use loss::*;
pub use optim::*;
pub use scaler::*;
pub use regressor::*;
