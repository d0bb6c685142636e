use super::super::{Model, Msg, ServiceState};
use gloo_file::File as GlooFile;
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::FileList;
use yew::prelude::*;

pub const ACCEPTED_TYPES: &str = "image/jpeg,image/png";

pub fn is_supported_type(mime: &str) -> bool {
    matches!(mime, "image/jpeg" | "image/jpg" | "image/png")
}

// Debounce function to limit button events
pub fn debounce<F>(duration: i32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));
    let timeout_clone = Rc::clone(&timeout);

    Callback::from(move |_| {
        let mut timeout_ref = timeout_clone.borrow_mut();

        if let Some(old_timeout) = timeout_ref.take() {
            old_timeout.cancel();
        }

        let inner_callback = callback.clone();
        let new_timeout = Timeout::new(duration as u32, move || {
            inner_callback();
        });

        *timeout_ref = Some(new_timeout);
    })
}

/// First JPEG/PNG file of the list, or the name of the first rejected file.
pub fn first_cell_image(file_list: &FileList) -> Result<GlooFile, String> {
    let mut rejected = None;
    for i in 0..file_list.length() {
        if let Some(file) = file_list.item(i) {
            if is_supported_type(&file.type_()) {
                return Ok(GlooFile::from(file));
            }
            rejected.get_or_insert(file.name());
        }
    }
    Err(match rejected {
        Some(name) => format!("Format non pris en charge : {} (JPG ou PNG attendu).", name),
        None => "Aucune image sélectionnée.".to_string(),
    })
}

pub fn render_error_message(model: &Model) -> Html {
    if let Some(error_msg) = &model.error {
        html! {
            <div class="error-message">
                <p>{ error_msg }</p>
            </div>
        }
    } else {
        html! {}
    }
}

pub fn render_service_banner(model: &Model, ctx: &Context<Model>) -> Html {
    match &model.service {
        ServiceState::Unavailable(detail) => html! {
            <div class="error-message service-unavailable" title={detail.clone()}>
                <p>{"Le service d'analyse est indisponible : le modèle n'a pas pu être chargé."}</p>
            </div>
        },
        ServiceState::Unreachable(detail) => html! {
            <div class="error-message service-unreachable" title={detail.clone()}>
                <p>{"Impossible de joindre le serveur d'analyse. Vérifiez votre connexion."}</p>
                <button class="analyze-btn secondary" onclick={ctx.link().callback(|_| Msg::CheckService)}>
                    {"Réessayer"}
                </button>
            </div>
        },
        ServiceState::Checking | ServiceState::Available => html! {},
    }
}
