mod api;
mod components;

use components::handlers;
use components::header::render_header;
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::sidebar::render_sidebar;
use components::upload_section::render_upload_section;
use components::utils::{render_error_message, render_service_banner};
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{AnalyzeResponse, HealthResponse};
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

pub struct FileData {
    pub file: GlooFile,
    pub preview_url: ObjectUrl,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceState {
    Checking,
    Available,
    /// The server answered that its model could not be loaded.
    Unavailable(String),
    /// The health request itself failed.
    Unreachable(String),
}

pub enum Msg {
    // File operations
    FileSelected(GlooFile),
    ClearFile,

    // Analysis operations
    Analyze,
    AnalysisDone(AnalyzeResponse),
    CheckService,
    HealthChecked(Result<HealthResponse, String>),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

pub struct Model {
    pub file: Option<FileData>,
    pub result: Option<AnalyzeResponse>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_dragging: bool,
    pub service: ServiceState,
    /// An upload arrived before the service state was known.
    pub pending_analysis: bool,
    paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let mut model = Self {
            file: None,
            result: None,
            loading: false,
            error: None,
            is_dragging: false,
            service: ServiceState::Checking,
            pending_analysis: false,
            paste_listener: None,
        };

        if let Some(window) = web_sys::window() {
            let link = ctx.link().clone();
            let listener = EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            });
            model.paste_listener = Some(listener);
        }

        handlers::check_service(ctx);
        model
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, ctx, file),
            Msg::ClearFile => handlers::handle_clear_file(self),

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::AnalysisDone(response) => handlers::handle_analysis_done(self, response),
            Msg::CheckService => handlers::handle_check_service(self, ctx),
            Msg::HealthChecked(outcome) => handlers::handle_health_checked(self, ctx, outcome),

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(self, ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                <div class="layout">
                    { render_sidebar() }
                    <main class="main-content">
                        { render_service_banner(self, ctx) }
                        { render_upload_section(self, ctx) }
                        { render_error_message(self) }
                        { render_preview_area(self, ctx) }
                        { render_results(self) }
                    </main>
                </div>
                <footer class="app-footer">
                    <h4>{"🧬 Votre Assistant Détection Paludisme"}</h4>
                    <p>
                        {"Créé avec passion par "}<strong>{"Youssouf"}</strong>
                        {" pour vous aider à analyser les cellules sanguines."}
                    </p>
                    <p class="version">{"Version 2024 - Mis à jour régulièrement pour améliorer la précision"}</p>
                    <p class="disclaimer">
                        {"⚠️ Rappel important : Cet outil est éducatif et ne remplace pas un diagnostic médical professionnel."}
                    </p>
                </footer>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<Model>::new().render();
}
