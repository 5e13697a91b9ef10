use super::super::{Model, Msg};
use super::utils::debounce;
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let Some(upload) = &model.upload else {
        return html! {};
    };
    let link = ctx.link().clone();

    html! {
        <div id="preview-container">
            <div class="selected-image-preview">
                <img src={upload.preview_url.to_string()} alt="Uploaded Image" />
                <p class="file-name">{ upload.file.name() }</p>
            </div>
            <div class="button-container">
                <button
                    id="clear-btn"
                    class="analyze-btn"
                    style="background-color: var(--clear-color);"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::ClearFile)
                    })}
                    disabled={model.loading}
                >
                    <i class="fa-solid fa-trash"></i>{" Clear"}
                </button>
                <button
                    id="analyze-btn"
                    class="analyze-btn"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Analyze)
                    })}
                    disabled={model.loading}
                >
                    if model.loading {
                        <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</>
                    } else {
                        <><i class="fa-solid fa-magnifying-glass"></i>{" Analyze Freshness"}</>
                    }
                </button>
            </div>
        </div>
    }
}
