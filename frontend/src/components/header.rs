use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header main-header">
            <h1>{"🦠 Détection du Paludisme avec CNN"}</h1>
            <p class="subtitle">
                {"Analysez une image de cellule sanguine pour détecter la présence de parasites"}
            </p>
        </header>
    }
}
