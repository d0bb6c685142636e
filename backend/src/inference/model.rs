use crate::error::{InferenceError, ModelLoadError};
use crate::inference::preprocess::{INPUT_SHAPE, NormalizedTensor};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tch::{CModule, Device, Kind, Tensor};

const TENSOR_DIMS: [i64; 4] = [
    INPUT_SHAPE[0] as i64,
    INPUT_SHAPE[1] as i64,
    INPUT_SHAPE[2] as i64,
    INPUT_SHAPE[3] as i64,
];

/// Raw classifier output. Close to 0 means infected, close to 1 means healthy.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct InfectionScore(f32);

impl InfectionScore {
    pub fn new(value: f32) -> Result<Self, InferenceError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InferenceError::InvalidScore(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Anything that can run one forward pass over a prepared input.
/// Implementations must not mutate shared state while scoring.
pub trait Classifier: Send + Sync {
    fn forward(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError>;
}

/// TorchScript model executed through libtorch.
pub struct TorchClassifier {
    module: Mutex<CModule>,
    device: Device,
}

impl TorchClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let device = Device::cuda_if_available();
        info!("Loading model from {} on {:?}", path.display(), device);

        let mut module =
            CModule::load_on_device(path, device).map_err(|e| ModelLoadError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        module.set_eval();

        Ok(Self {
            module: Mutex::new(module),
            device,
        })
    }
}

impl Classifier for TorchClassifier {
    fn forward(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_slice(&input.to_vec())
            .view(TENSOR_DIMS)
            .to_device(self.device);

        let module = self
            .module
            .lock()
            .map_err(|_| InferenceError::Backend("model lock poisoned".to_string()))?;
        let output = tch::no_grad(|| module.forward_ts(&[tensor]))
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let output_flat = output
            .to_device(Device::Cpu)
            .to_kind(Kind::Float)
            .view([-1]);
        Vec::<f32>::try_from(&output_flat).map_err(|e| InferenceError::Backend(e.to_string()))
    }
}

/// The loaded classifier plus the single scoring operation the rest of the
/// service uses.
#[derive(Clone)]
pub struct ModelGateway {
    classifier: Arc<dyn Classifier>,
    source: PathBuf,
}

impl ModelGateway {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }
        let classifier = TorchClassifier::load(path)?;
        Self::from_classifier(classifier, path)
    }

    /// Wraps an already constructed classifier after checking that it takes
    /// a 1x130x130x3 input and answers with one probability.
    pub fn from_classifier<C>(classifier: C, source: &Path) -> Result<Self, ModelLoadError>
    where
        C: Classifier + 'static,
    {
        let output = classifier
            .forward(&NormalizedTensor::probe())
            .map_err(|e| ModelLoadError::IncompatibleSignature(e.to_string()))?;
        match output.as_slice() {
            [value] => {
                InfectionScore::new(*value)
                    .map_err(|e| ModelLoadError::IncompatibleSignature(e.to_string()))?;
            }
            other => {
                return Err(ModelLoadError::IncompatibleSignature(format!(
                    "expected one output value, got {}",
                    other.len()
                )));
            }
        }

        info!("Model {} passed the input signature check", source.display());
        Ok(Self {
            classifier: Arc::new(classifier),
            source: source.to_path_buf(),
        })
    }

    pub fn score(&self, tensor: &NormalizedTensor) -> Result<InfectionScore, InferenceError> {
        debug_assert_eq!(tensor.shape(), &INPUT_SHAPE);

        let output = self.classifier.forward(tensor)?;
        match output.as_slice() {
            [value] => InfectionScore::new(*value),
            other => Err(InferenceError::UnexpectedOutputLen(other.len())),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Holds the gateway for the lifetime of the process. The first caller
/// performs the load; every later caller gets the same gateway or the same
/// load error.
pub struct ModelCell {
    path: PathBuf,
    slot: OnceLock<Result<Arc<ModelGateway>, ModelLoadError>>,
}

impl ModelCell {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: OnceLock::new(),
        }
    }

    pub fn get_or_load(&self) -> Result<Arc<ModelGateway>, ModelLoadError> {
        self.get_or_init_with(|| ModelGateway::load(&self.path))
    }

    pub fn get_or_init_with<F>(&self, init: F) -> Result<Arc<ModelGateway>, ModelLoadError>
    where
        F: FnOnce() -> Result<ModelGateway, ModelLoadError>,
    {
        self.slot
            .get_or_init(|| {
                let loaded = init().map(Arc::new);
                if let Err(e) = &loaded {
                    warn!("Model load failed, inference disabled: {}", e);
                }
                loaded
            })
            .clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
