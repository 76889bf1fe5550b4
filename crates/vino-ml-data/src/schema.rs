//! Column layout of the wine quality dataset.

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};

/// The 11 physicochemical feature columns, in file order.
pub const WINE_FEATURES: [&str; 11] = [
    "fixed acidity",
    "volatile acidity",
    "citric acid",
    "residual sugar",
    "chlorides",
    "free sulfur dioxide",
    "total sulfur dioxide",
    "density",
    "pH",
    "sulphates",
    "alcohol",
];

/// The sensory score (integer, 3..=9 in the white wine file).
pub const WINE_TARGET: &str = "quality";

/// All 12 columns, features first.
pub fn wine_columns() -> Vec<String> {
    WINE_FEATURES
        .iter()
        .chain(std::iter::once(&WINE_TARGET))
        .map(|c| c.to_string())
        .collect()
}

/// Require the header to be exactly the wine layout.
pub fn check_wine_schema(dataset: &Dataset) -> DataResult<()> {
    let expected = wine_columns();
    if dataset.columns() != expected.as_slice() {
        return Err(DataError::MalformedInput {
            line: 1,
            reason: format!(
                "header {:?} does not match the wine layout {:?}",
                dataset.columns(),
                expected
            ),
        });
    }
    Ok(())
}
