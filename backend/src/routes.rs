use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, warn};
use shared::{
    ErrorResponse, ErrorStatus, HealthResponse, REPORT_FILE_NAME, ReportRequest, render_report,
};
use std::path::PathBuf;

use crate::inference::InferenceError;
use crate::pipeline::{FreshnessPipeline, PipelineError};

const IMAGE_FIELD: &str = "image";

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: PathBuf) {
    cfg.service(web::resource("/api/predict").route(web::post().to(handle_predict)))
        .service(web::resource("/api/report").route(web::post().to(handle_report)))
        .service(web::resource("/api/health").route(web::get().to(health)));
    if frontend_dir.is_dir() {
        cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
    } else {
        warn!(
            "Frontend bundle not found at {}, serving the API only",
            frontend_dir.display()
        );
    }
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

async fn read_image_field(mut payload: Multipart) -> Result<Option<Upload>, Error> {
    while let Some(mut field) = payload.try_next().await? {
        let is_image = field.name() == Some(IMAGE_FIELD);
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if is_image {
                data.extend_from_slice(&chunk);
            }
        }
        if is_image {
            return Ok(Some(Upload { file_name, data }));
        }
    }
    Ok(None)
}

async fn handle_predict(
    pipeline: web::Data<FreshnessPipeline>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let Some(upload) = read_image_field(payload).await? else {
        return Ok(error_response(&PipelineError::MissingImage));
    };

    let result = web::block(move || pipeline.classify(&upload.file_name, &upload.data)).await?;
    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn handle_report(request: web::Json<ReportRequest>) -> HttpResponse {
    let report = render_report(request.label, request.confidence);
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(REPORT_FILE_NAME.to_string())],
        })
        .body(report)
}

async fn health(pipeline: web::Data<FreshnessPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: pipeline.loader().status(),
    })
}

fn error_response(e: &PipelineError) -> HttpResponse {
    let (code, status) = match e {
        PipelineError::MissingImage => (StatusCode::BAD_REQUEST, ErrorStatus::MissingImage),
        PipelineError::UnsupportedFileType(_) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, ErrorStatus::UnsupportedFileType)
        }
        PipelineError::InvalidImage(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorStatus::InvalidImage),
        PipelineError::Inference(InferenceError::ModelUnavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorStatus::ModelUnavailable)
        }
        PipelineError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorStatus::InferenceFailed),
    };
    if code.is_server_error() {
        error!("Prediction failed: {}", e);
    } else {
        warn!("Rejected upload: {}", e);
    }
    HttpResponse::build(code).json(ErrorResponse {
        error: e.to_string(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::loader::tests::fixed_loader;
    use crate::inference::preprocess::tests::sample_png;
    use crate::inference::{LoadError, ModelLoader};
    use actix_web::http::header;
    use actix_web::{App, test};
    use shared::{FreshnessClass, ModelStatus, PredictionResponse};

    const BOUNDARY: &str = "----freshness-test-boundary";

    fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(field: &str, file_name: &str, data: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/predict")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(field, file_name, data))
    }

    fn app_data(loader: ModelLoader) -> web::Data<FreshnessPipeline> {
        web::Data::new(FreshnessPipeline::new(loader))
    }

    fn unavailable_loader() -> ModelLoader {
        ModelLoader::from_fn(|| Err(LoadError::NotFound("model/model.tar.gz".into())))
    }

    #[actix_web::test]
    async fn predict_returns_classification() {
        let app = test::init_service(
            App::new()
                .app_data(app_data(fixed_loader(vec![0.92, 0.05, 0.03])))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent"))),
        )
        .await;

        let req = predict_request("image", "salmon.png", &sample_png(120, 80)).to_request();
        let resp: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.label, FreshnessClass::Fresh);
        assert!((resp.confidence - 0.92).abs() < 1e-6);
        assert!(resp.report.contains("Prediction: Fresh"));
        assert!(resp.report.contains("92.00%"));
        assert_eq!(resp.breakdown.len(), 3);
    }

    #[actix_web::test]
    async fn predict_error_statuses() {
        let app = test::init_service(
            App::new()
                .app_data(app_data(fixed_loader(vec![0.1, 0.2, 0.7])))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent"))),
        )
        .await;

        let req = predict_request("image", "salmon.gif", &sample_png(8, 8)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let req = predict_request("image", "salmon.jpg", b"this is not an image").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, ErrorStatus::InvalidImage);
        assert!(body.error.contains("could not decode image"));

        let req = predict_request("photo", "salmon.png", &sample_png(8, 8)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn predict_without_model_is_unavailable() {
        let app = test::init_service(
            App::new()
                .app_data(app_data(unavailable_loader()))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent"))),
        )
        .await;

        let req = predict_request("image", "cod.jpeg", &sample_png(16, 16)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, ErrorStatus::ModelUnavailable);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert!(matches!(health.model, ModelStatus::Unavailable { .. }));
    }

    #[actix_web::test]
    async fn health_reports_not_loaded_before_first_request() {
        let app = test::init_service(
            App::new()
                .app_data(app_data(fixed_loader(vec![0.1, 0.2, 0.7])))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent"))),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.model, ModelStatus::NotLoaded);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn report_download() {
        let app = test::init_service(
            App::new()
                .app_data(app_data(fixed_loader(vec![0.1, 0.2, 0.7])))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent"))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/report")
            .set_json(ReportRequest {
                label: FreshnessClass::Spoiled,
                confidence: 0.7,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("FishFreshnessReport.txt"));
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("Fish Freshness Prediction Report\n"));
        assert!(text.contains("Prediction: Spoiled\n"));
        assert!(text.contains("Confidence: 70.00%\n"));
    }
}
