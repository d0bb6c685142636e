use crate::config::Settings;
use crate::error::{AnalysisError, InferenceError, InvalidImageError};
use crate::inference::decision::InferenceDecision;
use crate::inference::model::ModelCell;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;
use futures_util::StreamExt;
use log::{error, info, warn};
use sha2::{Digest, Sha256};
use shared::{AnalyzeResponse, HealthResponse, ModelStatus};
use uuid::Uuid;

const IMAGE_FIELD: &str = "image";

pub struct AppState {
    pub model: ModelCell,
    pub settings: Settings,
}

impl AppState {
    pub fn new(model: ModelCell, settings: Settings) -> Self {
        Self { model, settings }
    }
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/analyze").route(web::post().to(handle_analyze)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    configure_api(cfg);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

async fn handle_analyze(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AnalysisError> {
    let request_id = Uuid::new_v4();

    let gateway = state.model.get_or_load().map_err(|e| {
        error!("[{}] refusing upload, model unavailable: {}", request_id, e);
        AnalysisError::Unavailable(e)
    })?;

    let upload = read_image_field(payload, state.settings.max_upload_bytes)
        .await
        .map_err(|e| {
            warn!("[{}] rejected upload: {}", request_id, e);
            AnalysisError::from(e)
        })?;
    let image_sha256 = hex::encode(Sha256::digest(&upload));
    info!(
        "[{}] analyzing {} bytes (sha256 {})",
        request_id,
        upload.len(),
        image_sha256
    );

    let decision = InferenceDecision::new(gateway);
    let outcome = web::block(move || decision.decide(&upload))
        .await
        .map_err(|e| AnalysisError::Inference(InferenceError::Worker(e.to_string())))
        .and_then(|result| result);

    let verdict = match outcome {
        Ok(verdict) => verdict,
        Err(e) => {
            error!("[{}] analysis failed ({}): {}", request_id, e.kind(), e);
            return Err(e);
        }
    };

    info!(
        "[{}] {} with probability {:.2}%",
        request_id,
        verdict.label,
        verdict.percentage()
    );

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        request_id: request_id.to_string(),
        analyzed_at: chrono::Utc::now().to_rfc3339(),
        image_sha256,
        verdict,
    }))
}

/// Returns the bytes of the first `image` field. Other fields are skipped.
async fn read_image_field(
    mut payload: Multipart,
    limit: usize,
) -> Result<Vec<u8>, InvalidImageError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| InvalidImageError::Multipart(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| InvalidImageError::Multipart(e.to_string()))?;
            if image_data.len() + data.len() > limit {
                return Err(InvalidImageError::TooLarge { limit });
            }
            image_data.extend_from_slice(&data);
        }

        if image_data.is_empty() {
            return Err(InvalidImageError::Empty);
        }
        return Ok(image_data);
    }

    Err(InvalidImageError::Missing)
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let model_path = state.model.path().display().to_string();
    match state.model.get_or_load() {
        Ok(gateway) => HttpResponse::Ok().json(HealthResponse {
            status: ModelStatus::Available,
            model_path: gateway.source().display().to_string(),
            detail: None,
        }),
        Err(e) => HttpResponse::ServiceUnavailable().json(HealthResponse {
            status: ModelStatus::Unavailable,
            model_path,
            detail: Some(e.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::ModelGateway;
    use crate::inference::testing::FakeClassifier;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use shared::{CellLabel, ErrorKind, ErrorResponse};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BOUNDARY: &str = "----cellscreeningboundary";

    fn cell_png() -> Vec<u8> {
        let pixels = RgbImage::from_pixel(130, 130, Rgb([200, 120, 140]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn multipart(field: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"cell.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(field: &str, bytes: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart(field, bytes))
    }

    fn ready_state(score: f32) -> (AppState, Arc<AtomicUsize>) {
        let fake = FakeClassifier::scoring(score);
        let scored = fake.scored();
        let cell = ModelCell::new("fake.pt");
        cell.get_or_init_with(|| ModelGateway::from_classifier(fake, Path::new("fake.pt")))
            .unwrap();
        (AppState::new(cell, Settings::default()), scored)
    }

    #[actix_web::test]
    async fn infected_upload_returns_red_verdict() {
        let (state, scored) = ready_state(0.1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp = test::call_service(&app, upload_request("image", &cell_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: AnalyzeResponse = test::read_body_json(resp).await;
        assert_eq!(body.verdict.label, CellLabel::Infected);
        assert!((body.verdict.displayed_probability - 0.9).abs() < 1e-6);
        assert_eq!(body.image_sha256.len(), 64);
        assert!(Uuid::parse_str(&body.request_id).is_ok());
        assert_eq!(scored.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn healthy_upload_returns_green_verdict() {
        let (state, _) = ready_state(0.9);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp = test::call_service(&app, upload_request("image", &cell_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: AnalyzeResponse = test::read_body_json(resp).await;
        assert_eq!(body.verdict.label, CellLabel::Healthy);
        assert!(!body.verdict.is_infected);
        assert!((body.verdict.displayed_probability - 0.9).abs() < 1e-6);
    }

    #[actix_web::test]
    async fn undecodable_upload_is_rejected_without_scoring() {
        let (state, scored) = ready_state(0.1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp =
            test::call_service(&app, upload_request("image", b"not an image").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::InvalidImage);
        assert_eq!(scored.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn upload_without_image_field_is_rejected() {
        let (state, scored) = ready_state(0.1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp =
            test::call_service(&app, upload_request("document", &cell_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(scored.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn oversized_upload_is_rejected() {
        let (mut state, scored) = ready_state(0.1);
        state.settings.max_upload_bytes = 16;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp = test::call_service(&app, upload_request("image", &cell_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::InvalidImage);
        assert_eq!(scored.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn missing_model_makes_the_service_unavailable() {
        let state = AppState::new(
            ModelCell::new("/nonexistent/malaria_detector_final.pt"),
            Settings::default(),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp = test::call_service(&app, upload_request("image", &cell_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, ErrorKind::ModelUnavailable);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let health: HealthResponse = test::read_body_json(resp).await;
        assert_eq!(health.status, ModelStatus::Unavailable);
        assert!(health.detail.unwrap().contains("not found"));
    }

    #[actix_web::test]
    async fn health_reports_loaded_model() {
        let (state, _) = ready_state(0.9);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = test::read_body_json(resp).await;
        assert_eq!(health.status, ModelStatus::Available);
        assert_eq!(health.model_path, "fake.pt");
    }
}
