use super::super::Model;
use shared::{FreshnessClass, REPORT_FILE_NAME, format_confidence, format_percentage};
use yew::prelude::*;

fn animation_url(class: FreshnessClass) -> &'static str {
    match class {
        FreshnessClass::Fresh => "https://lottie.host/f9acdb34-180b-41a6-8670-f579ae290779/V0fhWcwSKt.json",
        FreshnessClass::ModeratelyFresh => {
            "https://lottie.host/158eabfc-4d8d-4964-a2d6-f61a4d7d86f7/XGVqULGrWu.json"
        }
        FreshnessClass::Spoiled => "https://lottie.host/49b79f94-2c7e-4685-a96c-5c999f351f2b/xkRaWhpAkz.json",
    }
}

fn result_class(class: FreshnessClass) -> &'static str {
    match class {
        FreshnessClass::Fresh => "fresh",
        FreshnessClass::ModeratelyFresh => "moderate",
        FreshnessClass::Spoiled => "spoiled",
    }
}

pub fn render_results(model: &Model) -> Html {
    let Some(result) = &model.result else {
        return html! {};
    };
    let confidence = result.confidence.clamp(0.0, 1.0) * 100.0;

    html! {
        <div class={classes!("results-container", result_class(result.label))}>
            <div class="result-header">
                <h2>{ format!("Prediction: {}", result.label) }</h2>
                <div class="confidence-meter">
                    <div class="meter-label">{"Confidence:"}</div>
                    <div class="meter">
                        <div class="meter-fill" style={format!("width: {}%", confidence)}></div>
                    </div>
                    <div class="meter-value">{ format_confidence(result.confidence) }</div>
                </div>
            </div>

            <lottie-player
                src={animation_url(result.label)}
                background="transparent"
                speed="1"
                style="width: 220px; height: 220px;"
                loop=true
                autoplay=true
            />

            <pre class="advisory">{ result.advisory.clone() }</pre>

            <div class="detailed-results">
                <h3>{"Detailed Analysis"}</h3>
                <div class="result-bars">
                    { for result.breakdown.iter().map(|entry| html! {
                        <div class="result-item">
                            <div class="result-label">{ entry.class.label() }</div>
                            <div class="result-bar-container">
                                <div class="result-bar" style={format!("width: {}%", entry.percentage)}></div>
                            </div>
                            <div class="result-value">{ format_percentage(entry.percentage) }</div>
                        </div>
                    })}
                </div>
            </div>

            if let Some(url) = &model.report_url {
                <a class="analyze-btn download-btn" href={url.to_string()} download={REPORT_FILE_NAME}>
                    <i class="fa-solid fa-download"></i>{" Download Report"}
                </a>
            }
        </div>
    }
}
