//! # VinoML
//!
//! Wine quality regression: prepare the data, train two models, export and
//! deploy them, then compare their predictions.
//!
//! ## Modules
//!
//! - **core**: f64 tensor, shapes, the `Estimator` trait
//! - **linalg**: LU decomposition with partial pivoting, linear solves
//! - **data**: CSV loading, seeded shuffle, train/test split, label separation
//! - **linear**: OLS linear regression via the normal equation
//! - **nn**: Dense layers, Adam, the `DenseRegressor`
//! - **metrics**: MSE, RMSE, MAE, R²
//! - **serving**: Artifact export, deployment, remote prediction, comparison

/// Core tensor engine.
pub use vino_ml_core as core;

/// Linear algebra operations.
pub use vino_ml_linalg as linalg;

/// Data preparation pipeline.
pub use vino_ml_data as data;

/// Linear models.
pub use vino_ml_linear as linear;

/// Neural network regressor.
pub use vino_ml_nn as nn;

/// Evaluation metrics.
pub use vino_ml_metrics as metrics;

/// Export, deployment and comparison.
pub use vino_ml_serving as serving;
