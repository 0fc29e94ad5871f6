use rand::Rng;

use crate::activation::activation::{relu, relu_derivative, softmax};
use crate::error::{Error, Result};
use crate::layers::dense::Dense;
use crate::loss::cross_entropy::{one_hot, CrossEntropyLoss};
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::optim::sgd::Sgd;

/// Trainable tensors. `hidden` holds W1 (input x hidden) and b1; `output`
/// holds W2 (hidden x output) and b2.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub hidden: Dense,
    pub output: Dense,
}

/// Intermediate values of one forward pass, one row per sample.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    pub hidden_pre: Matrix,
    pub hidden_act: Matrix,
    pub output_probs: Matrix,
}

/// input -> Dense -> ReLU -> Dense -> softmax, trained by full-batch
/// gradient descent on categorical cross-entropy.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetwork {
    pub params: Parameters,
    pub optimizer: Sgd,
    /// Carried into every checkpoint written from this network.
    pub metadata: Option<ModelMetadata>,
}

impl NeuralNetwork {
    /// He-initialized network seeded from the thread RNG.
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, learning_rate: f64) -> Result<NeuralNetwork> {
        NeuralNetwork::with_rng(input_size, hidden_size, output_size, learning_rate, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<NeuralNetwork> {
        for (name, value) in [
            ("input_size", input_size),
            ("hidden_size", hidden_size),
            ("output_size", output_size),
        ] {
            if value == 0 {
                return Err(Error::hyperparameter(name, "must be at least 1"));
            }
        }
        let optimizer = Sgd::new(learning_rate)?;
        Ok(NeuralNetwork {
            params: Parameters {
                hidden: Dense::new(input_size, hidden_size, rng),
                output: Dense::new(hidden_size, output_size, rng),
            },
            optimizer,
            metadata: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.params.hidden.input_size()
    }

    pub fn hidden_size(&self) -> usize {
        self.params.hidden.size()
    }

    pub fn output_size(&self) -> usize {
        self.params.output.size()
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate
    }

    /// False once any weight or bias is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        [
            &self.params.hidden.weights,
            &self.params.hidden.biases,
            &self.params.output.weights,
            &self.params.output.biases,
        ]
        .iter()
        .all(|m| m.data.iter().all(|v| v.is_finite()))
    }

    fn check_inputs(&self, x: &Matrix) -> Result<()> {
        if x.cols != self.input_size() {
            return Err(Error::Shape(format!(
                "network expects {} input features, got {}",
                self.input_size(),
                x.cols
            )));
        }
        Ok(())
    }

    /// Forward pass over a batch (one sample per row).
    pub fn forward(&self, x: &Matrix) -> Result<ForwardPass> {
        self.check_inputs(x)?;
        let hidden_pre = self.params.hidden.pre_activation(x);
        let hidden_act = relu(&hidden_pre);
        let logits = self.params.output.pre_activation(&hidden_act);
        let output_probs = softmax(&logits);
        Ok(ForwardPass { hidden_pre, hidden_act, output_probs })
    }

    /// One full-batch gradient descent step. Returns the mean cross-entropy
    /// of the batch as it was *before* the update.
    ///
    /// Inputs are validated before anything is mutated.
    pub fn train_step(&mut self, x: &Matrix, labels: &[usize]) -> Result<f64> {
        self.check_inputs(x)?;
        if x.rows != labels.len() {
            return Err(Error::Shape(format!("{} input rows but {} labels", x.rows, labels.len())));
        }
        if x.rows == 0 {
            return Err(Error::EmptyDataset("training batch has no rows".into()));
        }
        let n_classes = self.output_size();
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(Error::Shape(format!("label {} out of range for {} classes", bad, n_classes)));
        }

        let pass = self.forward(x)?;
        let expected = one_hot(labels, n_classes);
        let loss = CrossEntropyLoss::loss(&pass.output_probs, &expected);

        // Backward pass. The hidden delta needs W2 before it is updated.
        let output_delta = CrossEntropyLoss::derivative(&pass.output_probs, &expected);
        let (w2_grad, b2_grad) = self.params.output.compute_gradients(&output_delta, &pass.hidden_act);

        let hidden_error = &output_delta * &self.params.output.weights.transpose();
        let hidden_delta = hidden_error.hadamard(&relu_derivative(&pass.hidden_pre));
        let (w1_grad, b1_grad) = self.params.hidden.compute_gradients(&hidden_delta, x);

        self.optimizer.step(&mut self.params.hidden, &w1_grad, &b1_grad);
        self.optimizer.step(&mut self.params.output, &w2_grad, &b2_grad);

        Ok(loss)
    }

    /// Predicted class index and its probability for every row.
    pub fn predict(&self, x: &Matrix) -> Result<(Vec<usize>, Vec<f64>)> {
        let probs = self.forward(x)?.output_probs;
        let indices = probs.argmax_rows();
        let confidences = indices.iter().enumerate()
            .map(|(row, &i)| probs.get(row, i))
            .collect();
        Ok((indices, confidences))
    }

    /// Convenience wrapper for a single feature vector.
    pub fn predict_one(&self, features: &[f64]) -> Result<(usize, f64)> {
        let x = Matrix::from_vec(1, features.len(), features.to_vec());
        let (indices, confidences) = self.predict(&x)?;
        Ok((indices[0], confidences[0]))
    }
}
