pub mod augment;
pub mod catalog;
pub mod dataset;
pub mod normalize;
pub mod split;
pub mod vectorize;
pub mod vocabulary;

pub use catalog::{Catalog, CatalogRecord};
pub use dataset::{Dataset, DatasetBuilder};
pub use normalize::NormalizationStats;
pub use split::{stratified_split, TrainValSplit};
pub use vectorize::{vectorize, vectorize_path, ImageSize};
pub use vocabulary::ClassVocabulary;
