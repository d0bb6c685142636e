use super::super::{Model, Msg, ServiceState};
use super::utils::debounce;
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(file_data) = &model.file else {
        return html! {};
    };
    let link = ctx.link().clone();
    let refused = matches!(model.service, ServiceState::Unavailable(_));

    html! {
        <div id="preview-container">
            <figure class="preview">
                <img id="actual-image-preview"
                    src={file_data.preview_url.to_string()}
                    alt={file_data.file.name()} />
                <figcaption>{"Image chargée"}</figcaption>
            </figure>
            <div class="button-container">
                <button
                    id="clear-btn"
                    class="analyze-btn secondary"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::ClearFile)
                    })}
                >
                    {"Effacer"}
                </button>
                <button
                    class="analyze-btn"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Analyze)
                    })}
                    disabled={model.loading || model.pending_analysis || refused}
                >
                    { render_analyze_button_content(model) }
                </button>
            </div>
        </div>
    }
}

fn render_analyze_button_content(model: &Model) -> Html {
    if model.loading {
        html! { {"Analyse en cours..."} }
    } else if model.pending_analysis {
        html! { {"Connexion au service..."} }
    } else {
        html! { {"Relancer l'analyse"} }
    }
}
