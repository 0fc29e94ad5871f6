use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layers::dense::Dense;
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::network::{NeuralNetwork, Parameters};
use crate::optim::sgd::Sgd;

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk layout of a trained network. Field order is the serialized order.
#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    format_version: u32,
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    w1: Matrix,
    w2: Matrix,
    b1: Matrix,
    b2: Matrix,
    learning_rate: f64,
    #[serde(default)]
    metadata: Option<ModelMetadata>,
}

impl Checkpoint {
    fn from_network(network: &NeuralNetwork) -> Checkpoint {
        Checkpoint {
            format_version: FORMAT_VERSION,
            input_size: network.input_size(),
            hidden_size: network.hidden_size(),
            output_size: network.output_size(),
            w1: network.params.hidden.weights.clone(),
            w2: network.params.output.weights.clone(),
            b1: network.params.hidden.biases.clone(),
            b2: network.params.output.biases.clone(),
            learning_rate: network.learning_rate(),
            metadata: network.metadata.clone(),
        }
    }

    /// Checks every tensor against the declared sizes.
    fn into_network(self) -> std::result::Result<NeuralNetwork, String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            ));
        }
        let expect = |name: &str, m: &Matrix, rows: usize, cols: usize| {
            if m.rows != rows || m.cols != cols || m.data.len() != rows * cols {
                Err(format!("{} is {}x{} ({} values), expected {}x{}", name, m.rows, m.cols, m.data.len(), rows, cols))
            } else {
                Ok(())
            }
        };
        expect("w1", &self.w1, self.input_size, self.hidden_size)?;
        expect("b1", &self.b1, 1, self.hidden_size)?;
        expect("w2", &self.w2, self.hidden_size, self.output_size)?;
        expect("b2", &self.b2, 1, self.output_size)?;
        if self.input_size == 0 || self.hidden_size == 0 || self.output_size == 0 {
            return Err("layer sizes must be non-zero".into());
        }

        if let Some(meta) = &self.metadata {
            if meta.classes.len() != self.output_size {
                return Err(format!(
                    "metadata lists {} classes for {} outputs",
                    meta.classes.len(),
                    self.output_size
                ));
            }
            if meta.normalization.len() != self.input_size || meta.image_size.feature_len() != self.input_size {
                return Err("metadata input dimensions disagree with the network".into());
            }
        }

        let optimizer = Sgd::new(self.learning_rate).map_err(|e| e.to_string())?;
        Ok(NeuralNetwork {
            params: Parameters {
                hidden: Dense { weights: self.w1, biases: self.b1 },
                output: Dense { weights: self.w2, biases: self.b2 },
            },
            optimizer,
            metadata: self.metadata,
        })
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_then_rename(network: &NeuralNetwork, tmp: &Path, path: &Path) -> Result<()> {
    {
        let file = File::create(tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &Checkpoint::from_network(network))
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        writer.flush()?;
    }
    std::fs::rename(tmp, path)?;
    Ok(())
}

impl NeuralNetwork {
    /// Writes the network (parameters, learning rate, metadata) as JSON.
    ///
    /// The file is written next to `path` and renamed into place, so a reader
    /// never sees a partially written checkpoint. Networks holding NaN or
    /// infinite parameters are rejected; JSON would store them as `null`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !self.is_finite() {
            return Err(Error::NonFiniteParameters { path: path.to_path_buf() });
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = temp_sibling(path);
        if let Err(e) = write_then_rename(self, &tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        debug!("checkpoint written to {}", path.display());
        Ok(())
    }

    /// Reads a network written by `save`. Missing, malformed or inconsistent
    /// files all yield `Error::ModelLoad`.
    pub fn load(path: impl AsRef<Path>) -> Result<NeuralNetwork> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::model_load(path, e))?;
        let checkpoint: Checkpoint = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::model_load(path, e))?;
        checkpoint.into_network().map_err(|reason| Error::model_load(path, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample_network() -> NeuralNetwork {
        NeuralNetwork::with_rng(6, 4, 2, 0.05, &mut StdRng::seed_from_u64(9)).unwrap()
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let net = sample_network();
        net.save(&path).unwrap();
        let loaded = NeuralNetwork::load(&path).unwrap();
        assert_eq!(loaded, net);
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("best.json");
        sample_network().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn serialized_fields_are_ordered_and_versioned() {
        let json = serde_json::to_string(&Checkpoint::from_network(&sample_network())).unwrap();
        let pos = |key: &str| json.find(&format!("\"{}\"", key)).unwrap();
        assert!(json.starts_with("{\"format_version\":1"));
        assert!(pos("input_size") < pos("w1"));
        assert!(pos("w1") < pos("w2"));
        assert!(pos("w2") < pos("b1"));
        assert!(pos("b2") < pos("learning_rate"));
    }

    #[test]
    fn non_finite_network_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut net = sample_network();
        net.params.output.biases.data[1] = f64::NAN;

        let err = net.save(&path);
        assert!(matches!(err, Err(Error::NonFiniteParameters { .. })));
        assert!(!path.exists());
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let path = dir.path().join("model.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        assert!(sample_network().save(&path).is_err());
        assert!(!temp_sibling(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn missing_file_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NeuralNetwork::load(dir.path().join("absent.json"));
        assert!(matches!(err, Err(Error::ModelLoad { .. })));
    }

    #[test]
    fn corrupt_file_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"format_version\": 1, \"input_size\": ").unwrap();
        assert!(matches!(NeuralNetwork::load(&path), Err(Error::ModelLoad { .. })));
    }

    #[test]
    fn wrong_version_or_shape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut cp = Checkpoint::from_network(&sample_network());
        cp.format_version = 99;
        std::fs::write(&path, serde_json::to_string(&cp).unwrap()).unwrap();
        assert!(matches!(NeuralNetwork::load(&path), Err(Error::ModelLoad { .. })));

        let mut cp = Checkpoint::from_network(&sample_network());
        cp.hidden_size = 5;
        std::fs::write(&path, serde_json::to_string(&cp).unwrap()).unwrap();
        assert!(matches!(NeuralNetwork::load(&path), Err(Error::ModelLoad { .. })));
    }
}
