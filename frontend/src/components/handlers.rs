use super::super::{FileData, Model, Msg, ServiceState};
use super::utils::first_cell_image;
use crate::api::{analyze_image, fetch_health};
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{AnalyzeResponse, HealthResponse, ModelStatus};
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

pub fn check_service(ctx: &Context<Model>) {
    let link = ctx.link().clone();
    spawn_local(async move {
        link.send_message(Msg::HealthChecked(fetch_health().await));
    });
}

/// Where a health reply leaves the page. A request that never got an answer
/// is kept apart from a server reporting its model as unavailable.
pub fn service_state(outcome: Result<HealthResponse, String>) -> ServiceState {
    match outcome {
        Ok(health) if health.status == ModelStatus::Available => ServiceState::Available,
        Ok(health) => {
            let detail = health.detail.unwrap_or_default();
            log::error!("model unavailable at {}: {}", health.model_path, detail);
            ServiceState::Unavailable(detail)
        }
        Err(e) => {
            log::warn!("health check failed: {}", e);
            ServiceState::Unreachable(e)
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AnalysisGate {
    Send,
    Wait,
    Recheck,
    Refuse,
}

pub fn analysis_gate(service: &ServiceState) -> AnalysisGate {
    match service {
        ServiceState::Available => AnalysisGate::Send,
        ServiceState::Checking => AnalysisGate::Wait,
        ServiceState::Unreachable(_) => AnalysisGate::Recheck,
        ServiceState::Unavailable(_) => AnalysisGate::Refuse,
    }
}

pub fn handle_check_service(model: &mut Model, ctx: &Context<Model>) -> bool {
    model.service = ServiceState::Checking;
    check_service(ctx);
    true
}

pub fn handle_health_checked(
    model: &mut Model,
    ctx: &Context<Model>,
    outcome: Result<HealthResponse, String>,
) -> bool {
    model.service = service_state(outcome);
    if !std::mem::take(&mut model.pending_analysis) {
        return true;
    }
    match analysis_gate(&model.service) {
        AnalysisGate::Send => handle_analyze(model, ctx),
        AnalysisGate::Recheck => {
            model.error = Some("Impossible de joindre le serveur d'analyse.".into());
            true
        }
        AnalysisGate::Wait | AnalysisGate::Refuse => true,
    }
}

/// A new upload replaces the previous one and is analyzed as soon as the
/// service is known to be up.
pub fn handle_file_selected(model: &mut Model, ctx: &Context<Model>, file: GlooFile) -> bool {
    let preview_url = ObjectUrl::from(file.clone());
    model.file = Some(FileData { file, preview_url });
    model.result = None;
    model.error = None;
    handle_analyze(model, ctx)
}

pub fn handle_clear_file(model: &mut Model) -> bool {
    model.file = None;
    model.result = None;
    model.error = None;
    model.loading = false;
    model.pending_analysis = false;
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(file_data) = &model.file else {
        model.error = Some("Aucune image sélectionnée.".into());
        return true;
    };

    match analysis_gate(&model.service) {
        AnalysisGate::Send => {
            model.loading = true;
            model.error = None;
            send_analysis_request(ctx, file_data.file.clone());
        }
        AnalysisGate::Wait => model.pending_analysis = true,
        AnalysisGate::Recheck => {
            model.pending_analysis = true;
            model.error = None;
            handle_check_service(model, ctx);
        }
        AnalysisGate::Refuse => {
            model.error = Some("Le service d'analyse est indisponible.".into());
        }
    }
    true
}

pub fn handle_analysis_done(model: &mut Model, response: AnalyzeResponse) -> bool {
    log::info!(
        "analysis {}: {} ({:.2}%)",
        response.request_id,
        response.verdict.label,
        response.verdict.percentage()
    );
    model.result = Some(response);
    model.loading = false;
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(data_transfer) = event.data_transfer() {
        if let Some(file_list) = data_transfer.files() {
            process_file_list(ctx, file_list);
        }
    }

    true
}

pub fn handle_paste(_model: &mut Model, ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if let Some(data_transfer) = event.clipboard_data() {
        if let Some(file_list) = data_transfer.files() {
            if file_list.length() > 0 {
                event.prevent_default();
                process_file_list(ctx, file_list);
                return true;
            }
        }
    }
    false
}

pub fn process_file_list(ctx: &Context<Model>, file_list: FileList) {
    match first_cell_image(&file_list) {
        Ok(file) => ctx.link().send_message(Msg::FileSelected(file)),
        Err(message) => {
            log::warn!("{}", message);
            ctx.link().send_message(Msg::SetError(Some(message)));
        }
    }
}

fn send_analysis_request(ctx: &Context<Model>, file: GlooFile) {
    let link = ctx.link().clone();
    spawn_local(async move {
        match analyze_image(&file).await {
            Ok(response) => link.send_message(Msg::AnalysisDone(response)),
            Err(message) => link.send_message(Msg::SetError(Some(message))),
        }
    });
}
