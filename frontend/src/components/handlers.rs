use super::super::{Model, Msg, Theme, Upload};
use super::utils::first_accepted_file;
use crate::api::request_prediction;
use gloo_file::{Blob, File as GlooFile, ObjectUrl};
use gloo_storage::{LocalStorage, Storage};
use shared::PredictionResponse;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent, FileList};
use yew::prelude::*;

const DARK_MODE_CLASS: &str = "dark-mode";

pub fn handle_file_selected(model: &mut Model, file: GlooFile) -> bool {
    let preview_url = ObjectUrl::from(file.clone());
    model.upload = Some(Upload { file, preview_url });
    model.result = None;
    model.report_url = None;
    model.error = None;
    true
}

pub fn handle_clear_file(model: &mut Model) -> bool {
    model.upload = None;
    model.result = None;
    model.report_url = None;
    model.error = None;
    model.loading = false;
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(upload) = &model.upload else {
        model.error = Some("Please select an image first.".into());
        return true;
    };
    if model.loading {
        return false;
    }

    model.loading = true;
    model.error = None;

    let file = upload.file.clone();
    let link = ctx.link().clone();
    spawn_local(async move {
        match request_prediction(&file).await {
            Ok(response) => link.send_message(Msg::PredictionReady(response)),
            Err(e) => {
                log::error!("Prediction failed: {}", e);
                link.send_message(Msg::SetError(Some(e)));
            }
        }
    });

    true
}

pub fn handle_prediction_ready(model: &mut Model, response: PredictionResponse) -> bool {
    log::info!(
        "Prediction {} -> {} ({:.4})",
        response.request_id,
        response.label,
        response.confidence
    );
    let report = Blob::new_with_options(response.report.as_str(), Some("text/plain"));
    model.report_url = Some(ObjectUrl::from(report));
    model.result = Some(response);
    model.loading = false;
    true
}

pub fn apply_theme(theme: Theme) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };
    let classes = body.class_list();
    let applied = match theme {
        Theme::Dark => classes.add_1(DARK_MODE_CLASS),
        Theme::Light => classes.remove_1(DARK_MODE_CLASS),
    };
    if let Err(e) = applied {
        log::warn!("Failed to apply theme: {:?}", e);
    }
}

pub fn handle_toggle_theme(model: &mut Model) -> bool {
    model.theme = model.theme.toggled();
    apply_theme(model.theme);
    if let Err(e) = LocalStorage::set(super::super::THEME_KEY, model.theme.as_str()) {
        log::warn!("Failed to persist theme: {}", e);
    }
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|dt| dt.files()) {
        process_file_list(ctx, &file_list);
    }

    true
}

pub fn handle_paste(_model: &mut Model, ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if let Some(file_list) = event.clipboard_data().and_then(|dt| dt.files()) {
        if file_list.length() > 0 {
            event.prevent_default();
            process_file_list(ctx, &file_list);
            return true;
        }
    }
    false
}

fn process_file_list(ctx: &Context<Model>, file_list: &FileList) {
    match first_accepted_file(file_list) {
        Some(file) => ctx.link().send_message(Msg::FileSelected(file)),
        None => ctx.link().send_message(Msg::SetError(Some(
            "Unsupported file type. Please choose a JPG, JPEG or PNG image.".into(),
        ))),
    }
}
