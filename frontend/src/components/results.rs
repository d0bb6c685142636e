use super::super::Model;
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    let Some(response) = &model.result else {
        return html! {};
    };
    let verdict = &response.verdict;
    let percentage = verdict.percentage();
    let icon = if verdict.is_infected { "✅ " } else { "🩺 " };

    html! {
        <div class={classes!("result-box", verdict.color.style_class())}>
            <h2>{ format!("{}{}", icon, verdict.label) }</h2>
            <p><strong>{"Probabilité :"}</strong>{ format!(" {:.2}%", percentage) }</p>
            <div class="meter">
                <div
                    class="meter-fill"
                    style={format!("width: {}%; background-color: {};", percentage, verdict.color.hex())}
                ></div>
            </div>
            <p class="advice">{ verdict.advisory_text.clone() }</p>
            <p class="analysis-id" title={response.image_sha256.clone()}>
                { format!("Analyse {} · {}", response.request_id, response.analyzed_at) }
            </p>
        </div>
    }
}
