use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

/// Trait for one-vs-rest binary classifiers
pub trait BinaryClassifier: Send + Sync {
    /// Train on feature rows and boolean targets
    fn fit(&mut self, features: &Array2<f64>, targets: &[bool]) -> Result<()>;

    /// Probability of the positive class for one feature row
    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<f64>;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// L2-regularised logistic regression.
///
/// Fitting is delegated to smartcore; only the weights and bias are kept,
/// so the fitted model is plain data and can cross threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    alpha: f64,

    weights: Option<Array1<f64>>,

    bias: f64,
}

impl LogisticRegressionClassifier {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            weights: None,
            bias: 0.0,
        }
    }

    fn ndarray_to_densematrix(arr: &Array2<f64>) -> DenseMatrix<f64> {
        let shape = arr.shape();
        let data: Vec<f64> = arr.iter().copied().collect();
        DenseMatrix::new(shape[0], shape[1], data, false)
    }
}

impl BinaryClassifier for LogisticRegressionClassifier {
    fn fit(&mut self, features: &Array2<f64>, targets: &[bool]) -> Result<()> {
        let (n_samples, n_features) = features.dim();
        if n_samples != targets.len() {
            return Err(AppError::Training(format!(
                "{} feature rows but {} targets",
                n_samples,
                targets.len()
            )));
        }
        if n_features == 0 {
            return Err(AppError::Training("no features to fit on".to_string()));
        }
        let n_positive = targets.iter().filter(|&&t| t).count();
        if n_positive == 0 || n_positive == n_samples {
            return Err(AppError::Training(
                "binary classifier needs both positive and negative examples".to_string(),
            ));
        }

        let x = Self::ndarray_to_densematrix(features);
        let y: Vec<i32> = targets.iter().map(|&t| i32::from(t)).collect();

        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model: LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>> =
            LogisticRegression::fit(&x, &y, params).map_err(|e| {
                AppError::Training(format!("Failed to train logistic regression: {}", e))
            })?;

        // binary fit: one coefficient row for the positive class
        let coefficients = model.coefficients();
        let weights = Array1::from_iter((0..n_features).map(|j| *coefficients.get((0, j))));
        self.bias = *model.intercept().get((0, 0));
        self.weights = Some(weights);

        Ok(())
    }

    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<f64> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| AppError::Internal("Model not trained".to_string()))?;

        if weights.len() != features.len() {
            return Err(AppError::Internal(format!(
                "expected {} features, got {}",
                weights.len(),
                features.len()
            )));
        }

        Ok(sigmoid(weights.dot(&features) + self.bias))
    }

    fn is_trained(&self) -> bool {
        self.weights.is_some()
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
