use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::{ErrorKind, ErrorResponse};
use std::path::PathBuf;

/// Failure to bring the classifier up. Stored for the lifetime of the
/// process once it happens, hence `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to load model artifact {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
    #[error("model rejected the 1x130x130x3 probe input: {0}")]
    IncompatibleSignature(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidImageError {
    #[error("no image field in upload")]
    Missing,
    #[error("uploaded file is empty")]
    Empty,
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("image could not be decoded: {0}")]
    Undecodable(String),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("forward pass failed: {0}")]
    Backend(String),
    #[error("expected a single output value, model returned {0}")]
    UnexpectedOutputLen(usize),
    #[error("model output {0} is not a probability")]
    InvalidScore(f32),
    #[error("inference worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("model unavailable: {0}")]
    Unavailable(ModelLoadError),
    #[error(transparent)]
    InvalidImage(#[from] InvalidImageError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Unavailable(_) => ErrorKind::ModelUnavailable,
            AnalysisError::InvalidImage(_) => ErrorKind::InvalidImage,
            AnalysisError::Inference(_) => ErrorKind::AnalysisFailed,
        }
    }

    /// Message shown on the page. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Unavailable(_) => {
                "Le service d'analyse est indisponible : le modèle n'a pas pu être chargé. \
                 Contactez l'administrateur."
                    .to_string()
            }
            AnalysisError::InvalidImage(InvalidImageError::TooLarge { limit }) => format!(
                "L'image dépasse la taille maximale autorisée ({}).",
                format_limit(*limit)
            ),
            AnalysisError::InvalidImage(_) => {
                "Veuillez fournir une image de cellule valide (JPG ou PNG).".to_string()
            }
            AnalysisError::Inference(_) => {
                "L'analyse de l'image a échoué. Veuillez réessayer.".to_string()
            }
        }
    }
}

fn format_limit(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    if bytes >= MIB {
        if bytes % MIB == 0 {
            format!("{} Mo", bytes / MIB)
        } else {
            format!("{:.1} Mo", bytes as f64 / MIB as f64)
        }
    } else if bytes >= KIB {
        format!("{} Ko", bytes / KIB)
    } else {
        format!("{} octets", bytes)
    }
}

impl ResponseError for AnalysisError {
    fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::InvalidImage(InvalidImageError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AnalysisError::InvalidImage(InvalidImageError::UnsupportedFormat(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AnalysisError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            kind: self.kind(),
            message: self.user_message(),
        })
    }
}
