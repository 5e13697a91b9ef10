use gloo_file::File as GlooFile;
use gloo_net::http::Request;
use shared::{ErrorResponse, PredictionResponse};
use wasm_bindgen::JsValue;
use web_sys::FormData;

fn js_error(e: JsValue) -> String {
    format!("{:?}", e)
}

/// Uploads one image to the classifier and returns its verdict.
pub async fn request_prediction(file: &GlooFile) -> Result<PredictionResponse, String> {
    let form_data = FormData::new().map_err(js_error)?;
    form_data
        .append_with_blob_and_filename("image", file.as_ref(), &file.name())
        .map_err(js_error)?;

    let response = Request::post("/api/predict")
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if response.ok() {
        return response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e));
    }

    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(body.error),
        Err(_) => Err(format!("Server error: {}", status)),
    }
}
