use gloo_file::File as GlooFile;
use gloo_net::http::{Request, Response};
use shared::{AnalyzeResponse, ErrorResponse, HealthResponse};

pub async fn analyze_image(file: &GlooFile) -> Result<AnalyzeResponse, String> {
    let form_data = web_sys::FormData::new()
        .map_err(|_| "Impossible de préparer l'envoi de l'image.".to_string())?;
    form_data
        .append_with_blob("image", file.as_ref())
        .map_err(|_| "Impossible de joindre l'image.".to_string())?;

    let request = Request::post("/api/analyze")
        .body(form_data)
        .map_err(|e| format!("Requête invalide : {}", e))?;
    let response = request
        .send()
        .await
        .map_err(|e| format!("Erreur réseau : {}", e))?;

    if response.ok() {
        response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| format!("Réponse illisible : {}", e))
    } else {
        Err(error_message(response).await)
    }
}

pub async fn fetch_health() -> Result<HealthResponse, String> {
    let response = Request::get("/api/health")
        .send()
        .await
        .map_err(|e| format!("Erreur réseau : {}", e))?;

    // 503 still carries a HealthResponse body.
    response
        .json::<HealthResponse>()
        .await
        .map_err(|e| format!("Réponse illisible : {}", e))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => {
            log::warn!("analysis rejected ({}): {}", body.kind, body.message);
            body.message
        }
        Err(_) => format!("Erreur serveur : {}", status),
    }
}
