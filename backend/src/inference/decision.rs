use crate::error::AnalysisError;
use crate::inference::model::ModelGateway;
use crate::inference::preprocess::{NormalizedTensor, UploadedImage};
use log::debug;
use shared::Verdict;
use std::sync::Arc;

/// Upload bytes in, verdict out. One instance per request; cheap to build.
pub struct InferenceDecision {
    gateway: Arc<ModelGateway>,
}

impl InferenceDecision {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self { gateway }
    }

    pub fn decide(&self, upload: &[u8]) -> Result<Verdict, AnalysisError> {
        let image = UploadedImage::decode(upload)?;
        let tensor = NormalizedTensor::from_image(&image);
        let score = self.gateway.score(&tensor)?;

        let verdict = Verdict::from_score(score.value());
        debug!(
            "score {:.4} -> {} ({:.2}%)",
            score.value(),
            verdict.label,
            verdict.percentage()
        );
        Ok(verdict)
    }
}
