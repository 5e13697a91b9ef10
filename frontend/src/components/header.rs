use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-fish"></i> {" AI-Based Fish Freshness Detector"}</h1>
            <p class="subtitle">{"Upload a fish image to analyze its freshness using a deep learning model."}</p>
        </header>
    }
}

pub fn render_about() -> Html {
    html! {
        <aside class="about-panel">
            <h2>{"About"}</h2>
            <p>{"This app predicts fish freshness using AI."}</p>
            <p>{"Upload a clear photo of a fish and get an instant analysis."}</p>
            <p class="file-types">{"Fresh, Moderately Fresh or Spoiled, with a confidence score and a downloadable report."}</p>
        </aside>
    }
}
