mod api;
mod components;

use components::handlers;
use components::header::{render_about, render_header};
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::theme_toggle::render_theme_toggle;
use components::upload_section::render_upload_section;
use components::utils::render_error_message;
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use gloo_storage::{LocalStorage, Storage};
use shared::PredictionResponse;
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

const THEME_KEY: &str = "fish-freshness-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn stored() -> Self {
        match LocalStorage::get::<String>(THEME_KEY).as_deref() {
            Ok("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The image currently selected for analysis.
pub struct Upload {
    file: GlooFile,
    preview_url: ObjectUrl,
}

// Yew msg components
pub enum Msg {
    // File operations
    FileSelected(GlooFile),
    ClearFile,

    // Analysis operations
    Analyze,
    PredictionReady(PredictionResponse),

    // UI states
    SetError(Option<String>),
    SetDragging(bool),
    ToggleTheme,

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

pub struct Model {
    upload: Option<Upload>,
    result: Option<PredictionResponse>,
    report_url: Option<ObjectUrl>,
    loading: bool,
    error: Option<String>,
    is_dragging: bool,
    theme: Theme,
    _paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let theme = Theme::stored();
        handlers::apply_theme(theme);

        let paste_listener = web_sys::window().map(|window| {
            let link = ctx.link().clone();
            EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            })
        });

        Self {
            upload: None,
            result: None,
            report_url: None,
            loading: false,
            error: None,
            is_dragging: false,
            theme,
            _paste_listener: paste_listener,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FileSelected(file) => handlers::handle_file_selected(self, file),
            Msg::ClearFile => handlers::handle_clear_file(self),

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::PredictionReady(response) => handlers::handle_prediction_ready(self, response),

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }
            Msg::ToggleTheme => handlers::handle_toggle_theme(self),

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(self, ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                { render_theme_toggle(self.theme, ctx.link()) }

                <div class="layout">
                    { render_about() }
                    <main class="main-content">
                        { render_upload_section(self, ctx) }
                        { render_preview_area(self, ctx) }
                        { render_error_message(self) }
                        { render_results(self) }
                    </main>
                </div>

                <footer class="app-footer">
                    <p>{"Fish Freshness Detector | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
