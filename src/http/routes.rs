use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::extract::multipart::Multipart;
use axum::extract::{DefaultBodyLimit, FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::{log_extraction_error, log_model_error, ApiErrorCodes};

/// Largest accepted request body, uploads included
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// JSON request shape for the path-reference variant.
#[derive(Debug, Deserialize)]
struct AudioPathRequest {
    audio_path: String,
}

/// Success payload for `/predict-audio`.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub status: u16,
    pub message: &'static str,
    pub data: BTreeMap<String, f32>,
}

/// Error payload matching the wire contract.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: &'static str,
    pub err: ErrorEnvelope,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub data: ErrorData,
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub code: i32,
}

/// Request failures mapped to the wire contract.
///
/// Every failure a request can hit collapses to one of these, keeping the
/// `(status, code)` pairs stable for clients: missing input is `(400, -1)`,
/// anything past input validation is `(500, -2)`.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// No usable audio in the request
    NoAudio,
    /// The uploaded filename does not end in `.wav`
    UnsupportedFormat,
    /// Extraction or inference failed
    Pipeline,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoAudio | ApiError::UnsupportedFormat => StatusCode::BAD_REQUEST,
            ApiError::Pipeline => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::NoAudio => "Bad Request, No Audio Provided",
            ApiError::UnsupportedFormat => "Bad Request, Unsupported Audio Format",
            ApiError::Pipeline => "Something Wrong with model",
        }
    }

    fn code(&self) -> i32 {
        match self {
            ApiError::NoAudio | ApiError::UnsupportedFormat => ApiErrorCodes::NO_AUDIO,
            ApiError::Pipeline => ApiErrorCodes::PIPELINE_FAILED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.message(),
            err: ErrorEnvelope {
                data: ErrorData { code: self.code() },
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Build the Axum router with all handlers.
pub fn build_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/predict-audio", post(predict_audio))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(context)
}

/// Run the HTTP server loop until ctrl-c.
pub async fn run_http_server(context: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding prediction listener")?;
    tracing::info!("Listening on {}", addr);

    let router = build_router(context);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving prediction router")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Handle `POST /predict-audio`.
///
/// Accepts either a multipart upload (field `file`, `.wav` only, persisted
/// under the data directory) or a JSON body naming a server-local path,
/// which is used as-is. Feature extraction and inference run on a blocking
/// worker so the request task is not pinned by CPU work.
pub async fn predict_audio(
    State(context): State<Arc<AppContext>>,
    request: Request,
) -> Result<Json<PredictionResponse>, ApiError> {
    let audio_path = resolve_audio_source(&context, request).await?;

    let worker = Arc::clone(&context);
    let prediction = tokio::task::spawn_blocking(move || {
        let features = worker.extractor().extract_file(&audio_path).map_err(|err| {
            log_extraction_error(&err, "predict_audio");
            ApiError::Pipeline
        })?;
        worker.classifier().predict(&features).map_err(|err| {
            log_model_error(&err, "predict_audio");
            ApiError::Pipeline
        })
    })
    .await
    .map_err(|err| {
        tracing::error!("Prediction task failed to complete: {}", err);
        ApiError::Pipeline
    })??;

    Ok(Json(PredictionResponse {
        status: 200,
        message: "OK",
        data: prediction.to_map(),
    }))
}

/// Turn the request into a path the pipeline can read.
///
/// Multipart uploads are validated and written to disk; JSON path
/// references are returned untouched. Anything else is missing input.
async fn resolve_audio_source(
    context: &AppContext,
    request: Request,
) -> Result<PathBuf, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::NoAudio)?;
        save_upload(context, multipart).await
    } else if content_type.starts_with("application/json") {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| ApiError::NoAudio)?;
        let payload: AudioPathRequest =
            serde_json::from_slice(&bytes).map_err(|_| ApiError::NoAudio)?;
        if payload.audio_path.is_empty() {
            return Err(ApiError::NoAudio);
        }
        // The path is used as given; reachability problems surface as
        // extraction failures downstream.
        Ok(PathBuf::from(payload.audio_path))
    } else {
        Err(ApiError::NoAudio)
    }
}

/// Persist the uploaded `file` field under a timestamped name.
async fn save_upload(context: &AppContext, mut multipart: Multipart) -> Result<PathBuf, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::NoAudio)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        if file_name.is_empty() {
            return Err(ApiError::NoAudio);
        }
        if !has_wav_extension(&file_name) {
            return Err(ApiError::UnsupportedFormat);
        }

        let bytes = field.bytes().await.map_err(|_| ApiError::NoAudio)?;
        let path = context.config().server.data_dir.join(upload_file_name());
        tokio::fs::write(&path, &bytes).await.map_err(|err| {
            tracing::error!("Failed to persist upload to {:?}: {}", path, err);
            ApiError::Pipeline
        })?;

        tracing::info!("Saved upload {:?} ({} bytes)", path, bytes.len());
        return Ok(path);
    }

    Err(ApiError::NoAudio)
}

fn has_wav_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Millisecond-precision local timestamp, forced to a `.wav` name
fn upload_file_name() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%3f.wav").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "predict-test-boundary";

    /// Encode a sine wave as 16-bit mono WAV bytes
    fn wav_bytes(sample_rate: u32, frequency: f32, secs: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("writer");
            let total = (sample_rate as f32 * secs) as usize;
            for i in 0..total {
                let t = i as f32 / sample_rate as f32;
                let sample = (2.0 * std::f32::consts::PI * frequency * t).sin();
                writer
                    .write_sample((sample * i16::MAX as f32 * 0.5) as i16)
                    .expect("sample");
            }
            writer.finalize().expect("finalize");
        }
        cursor.into_inner()
    }

    /// Assemble a single-field multipart body by hand
    fn multipart_body(field_name: &str, file_name: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field_name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict-audio")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .expect("multipart request")
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict-audio")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("json request")
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
        (status, json)
    }

    fn assert_error_shape(json: &Value, status: u16, message: &str, code: i64) {
        assert_eq!(json["status"], status);
        assert_eq!(json["message"], message);
        assert_eq!(json["err"]["data"]["code"], code);
    }

    #[tokio::test]
    async fn missing_body_is_rejected() {
        let (context, _dir) = AppContext::new_test();
        let request = Request::builder()
            .method("POST")
            .uri("/predict-audio")
            .body(Body::empty())
            .expect("empty request");

        let (status, json) = response_json(
            build_router(context)
                .oneshot(request)
                .await
                .expect("predict call"),
        )
        .await;

        println!("[HTTP Smoke] /predict-audio (empty) => {json}");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_shape(&json, 400, "Bad Request, No Audio Provided", -1);
    }

    #[tokio::test]
    async fn json_without_audio_path_is_rejected() {
        let (context, _dir) = AppContext::new_test();
        let (status, json) = response_json(
            build_router(context)
                .oneshot(json_request(r#"{"path": "clip.wav"}"#))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_shape(&json, 400, "Bad Request, No Audio Provided", -1);
    }

    #[tokio::test]
    async fn json_with_empty_audio_path_is_rejected() {
        let (context, _dir) = AppContext::new_test();
        let (status, json) = response_json(
            build_router(context)
                .oneshot(json_request(r#"{"audio_path": ""}"#))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_shape(&json, 400, "Bad Request, No Audio Provided", -1);
    }

    #[tokio::test]
    async fn json_with_unreadable_path_reports_pipeline_failure() {
        let (context, _dir) = AppContext::new_test();
        let (status, json) = response_json(
            build_router(context)
                .oneshot(json_request(
                    r#"{"audio_path": "/nonexistent/recording.wav"}"#,
                ))
                .await
                .expect("predict call"),
        )
        .await;

        println!("[HTTP Smoke] /predict-audio (bad path) => {json}");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_error_shape(&json, 500, "Something Wrong with model", -2);
    }

    #[tokio::test]
    async fn json_path_to_valid_wav_predicts() {
        let (context, dir) = AppContext::new_test();
        let wav_path = dir.path().join("reference.wav");
        std::fs::write(&wav_path, wav_bytes(22_050, 440.0, 3.2)).expect("write wav");

        let body = format!(r#"{{"audio_path": {:?}}}"#, wav_path.to_string_lossy());
        let (status, json) = response_json(
            build_router(context)
                .oneshot(json_request(&body))
                .await
                .expect("predict call"),
        )
        .await;

        println!("[HTTP Smoke] /predict-audio (path) => {json}");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], 200);
        assert_eq!(json["message"], "OK");

        let data = json["data"].as_object().expect("data object");
        let keys: Vec<&String> = data.keys().collect();
        assert_eq!(keys, ["asthma", "bronchial", "copd", "healthy", "pneumonia"]);
        let sum: f64 = data.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((sum - 1.0).abs() < 1e-3, "Probabilities sum to {}", sum);
    }

    #[tokio::test]
    async fn multipart_upload_predicts_and_persists() {
        let (context, _dir) = AppContext::new_test();
        let data_dir = context.config().server.data_dir.clone();

        let body = multipart_body("file", "breath.wav", &wav_bytes(22_050, 440.0, 3.2));
        let (status, json) = response_json(
            build_router(Arc::clone(&context))
                .oneshot(multipart_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        println!("[HTTP Smoke] /predict-audio (upload) => {json}");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"].as_object().expect("data object").len(), 5);

        let saved: Vec<_> = std::fs::read_dir(&data_dir)
            .expect("read data dir")
            .map(|entry| entry.expect("entry").path())
            .collect();
        assert_eq!(saved.len(), 1, "Upload should be persisted once");
        assert_eq!(
            saved[0].extension().and_then(|e| e.to_str()),
            Some("wav"),
            "Saved name is forced to .wav"
        );
    }

    #[tokio::test]
    async fn multipart_with_wrong_extension_is_rejected_before_saving() {
        let (context, _dir) = AppContext::new_test();
        let data_dir = context.config().server.data_dir.clone();

        let body = multipart_body("file", "breath.mp3", &wav_bytes(22_050, 440.0, 1.0));
        let (status, json) = response_json(
            build_router(context)
                .oneshot(multipart_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_shape(&json, 400, "Bad Request, Unsupported Audio Format", -1);
        assert_eq!(
            std::fs::read_dir(&data_dir).expect("read data dir").count(),
            0,
            "Rejected upload must not be persisted"
        );
    }

    #[tokio::test]
    async fn multipart_without_file_field_is_rejected() {
        let (context, _dir) = AppContext::new_test();
        let body = multipart_body("attachment", "breath.wav", b"not audio");
        let (status, json) = response_json(
            build_router(context)
                .oneshot(multipart_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_shape(&json, 400, "Bad Request, No Audio Provided", -1);
    }

    #[tokio::test]
    async fn corrupt_upload_fails_without_crashing() {
        let (context, _dir) = AppContext::new_test();

        let body = multipart_body("file", "noise.wav", b"definitely not a wav file");
        let (status, json) = response_json(
            build_router(Arc::clone(&context))
                .oneshot(multipart_request(body))
                .await
                .expect("predict call"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_error_shape(&json, 500, "Something Wrong with model", -2);

        // A later well-formed request on the same context still works
        let body = multipart_body("file", "breath.wav", &wav_bytes(22_050, 440.0, 3.2));
        let (status, _) = response_json(
            build_router(context)
                .oneshot(multipart_request(body))
                .await
                .expect("predict call"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn upload_names_are_wav_timestamps() {
        let name = upload_file_name();
        assert!(name.ends_with(".wav"), "got {}", name);
        // YYYYMMDDHHMMSSmmm digits before the extension
        let stem = name.trim_end_matches(".wav");
        assert_eq!(stem.len(), 17, "got {}", stem);
        assert!(stem.chars().all(|c| c.is_ascii_digit()), "got {}", stem);
    }

    #[test]
    fn wav_extension_check_is_case_insensitive() {
        assert!(has_wav_extension("clip.wav"));
        assert!(has_wav_extension("CLIP.WAV"));
        assert!(has_wav_extension("breath.Wav"));
        assert!(!has_wav_extension("clip.mp3"));
        assert!(!has_wav_extension("clip"));
        assert!(!has_wav_extension("wav"));
    }
}
