use super::super::{Model, Msg, ServiceState};
use super::utils::{ACCEPTED_TYPES, debounce, first_cell_image};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    if let ServiceState::Unavailable(_) = model.service {
        return html! {};
    }

    let link = ctx.link();
    let handle_change = link.callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let selected = input.files().map(|files| first_cell_image(&files));
        input.set_value("");

        match selected {
            Some(Ok(file)) => Msg::FileSelected(file),
            Some(Err(message)) => Msg::SetError(Some(message)),
            None => Msg::SetError(Some("Aucune image sélectionnée.".into())),
        }
    });

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    let handle_drop = link.callback(Msg::HandleDrop);
    let trigger_file_input = Callback::from(|_| {
        let input = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id("file-input"));
        if let Some(input) = input {
            if let Ok(html_input) = input.dyn_into::<web_sys::HtmlElement>() {
                html_input.click();
            }
        }
    });

    html! {
        <div class="upload-section">
            <input
                type="file"
                id="file-input"
                accept={ACCEPTED_TYPES}
                style="display: none;"
                onchange={handle_change}
            />

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={handle_drop}
                onclick={debounce(300, {
                    let trigger_file_input = trigger_file_input.clone();
                    move || trigger_file_input.emit(())
                })}
            >
                <div class="upload-placeholder">
                    <p>{"📤 Choisissez une image de cellule..."}</p>
                    <p class="file-types">{"Formats acceptés : JPG, JPEG, PNG"}</p>
                </div>
            </div>
        </div>
    }
}
