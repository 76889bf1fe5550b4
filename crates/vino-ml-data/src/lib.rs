pub mod error;
pub mod schema;
pub mod dataset;
pub mod csv_io;
pub mod shuffle;
pub mod split;
pub mod separate;
pub mod dataloader;
pub mod synthetic;
pub mod pipeline;

pub use error::{DataError, DataResult};
pub use schema::{WINE_FEATURES, WINE_TARGET};
pub use dataset::{Dataset, Record};
pub use csv_io::{load_dataset, read_dataset, write_dataset};
pub use shuffle::shuffle;
pub use split::{split, Split};
pub use separate::{separate, FeatureMatrix, LabelVector};
pub use dataloader::DataLoader;
pub use pipeline::{DataConfig, DataPipeline, PreparedData};
