use yew::prelude::*;

pub fn render_sidebar() -> Html {
    html! {
        <aside class="sidebar">
            <h2>{"ℹ️ À propos"}</h2>
            <div class="note success">
                {"🧬 Cet outil repose sur un "}<strong>{"réseau de neurones convolutionnel (CNN)"}</strong>
                {" entraîné sur des images microscopiques de cellules sanguines."}
            </div>
            <div class="note">
                <strong>{"⚙️ Fonctionnement :"}</strong>
                <ul>
                    <li>{"📥 "}<strong>{"Entrée"}</strong>{" : Image d'une cellule (JPG/PNG)"}</li>
                    <li>{"📊 "}<strong>{"Sortie"}</strong>{" : Probabilité d'infection"}</li>
                </ul>
            </div>
            <div class="note info">{"📈 "}<strong>{"Précision du modèle : ~98%"}</strong></div>
            <div class="note warning">
                {"⚠️ "}<strong>{"Important :"}</strong>
                {" Cet outil est à objectif "}<strong>{"éducatif"}</strong>
                {" et "}<strong>{"ne remplace pas"}</strong>
                {" un diagnostic médical professionnel."}
            </div>
        </aside>
    }
}
