use crate::error::InferenceError;
use crate::inference::model::Classifier;
use crate::inference::preprocess::NormalizedTensor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stand-in classifier. The first forward pass is the load-time probe and
/// returns `probe`; every later pass returns `response` and is counted.
pub struct FakeClassifier {
    probe: Vec<f32>,
    response: Vec<f32>,
    forwards: AtomicUsize,
    scored: Arc<AtomicUsize>,
}

impl FakeClassifier {
    pub fn scoring(score: f32) -> Self {
        Self::responding(vec![score])
    }

    pub fn responding(response: Vec<f32>) -> Self {
        Self {
            probe: vec![0.5],
            response,
            forwards: AtomicUsize::new(0),
            scored: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_probe(probe: Vec<f32>) -> Self {
        Self {
            probe,
            ..Self::scoring(0.5)
        }
    }

    /// Number of scoring calls, probe excluded.
    pub fn scored(&self) -> Arc<AtomicUsize> {
        self.scored.clone()
    }
}

impl Classifier for FakeClassifier {
    fn forward(&self, _input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        if self.forwards.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(self.probe.clone());
        }
        self.scored.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
