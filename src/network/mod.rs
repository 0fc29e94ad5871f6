pub mod checkpoint;
pub mod metadata;
pub mod network;

pub use network::{ForwardPass, NeuralNetwork, Parameters};
pub use metadata::ModelMetadata;
