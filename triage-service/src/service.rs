use anyhow::Context as _;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use triage_core::storage::{group_by_category, seed_samples};
use triage_core::{
    Advisor, Authenticator, CategoryEntry, ChatCompletionAdvisor, FileBlob,
    InMemorySymptomCatalog, InMemoryVerdictStore, Page, PageRequest, PostgresVerdictStore,
    PredictionPipeline, PredictionRecord, PredictionStats, PredictionSummary, ReportPipeline,
    StaticTokenAuthenticator, StorageError, SymptomCatalog, SymptomListing, TextExtractor,
    TriageConfig, TriageDesk, TriageError, UserId, VerdictStore, VisionOcr, bearer_token,
    load_classifier,
};
use uuid::Uuid;

use crate::models::{
    CreatePredictionRequest, HistoryQuery, ReportAnalysisResponse, ReportUpload,
    SymptomSearchQuery,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

/// Uploads above this size are rejected before reaching the handler.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn triage_error(err: TriageError) -> ApiError {
    match err {
        TriageError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message, "field": field })),
        ),
        TriageError::AuthenticationRequired => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        ),
        TriageError::Decode(details) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Uploaded file is not a readable image",
                "details": details
            })),
        ),
        other => {
            error!("Request failed: {}", other);
            internal_error("Internal Server Error", &other.to_string())
        }
    }
}

fn catalog_error(err: StorageError) -> ApiError {
    error!("Symptom catalogue failed: {}", err);
    internal_error("Internal Server Error", &err.to_string())
}

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<TriageDesk>,
    pub catalog: Arc<dyn SymptomCatalog>,
    pub authenticator: Arc<dyn Authenticator>,
}

pub async fn create_app(config: &TriageConfig) -> anyhow::Result<Router> {
    let app_state = create_app_state(config).await?;
    Ok(build_router(app_state))
}

/// Loads the classifier and wires every collaborator. A classifier that
/// fails to load is fatal.
pub async fn create_app_state(config: &TriageConfig) -> anyhow::Result<AppState> {
    let classifier =
        load_classifier(&config.classifier).context("failed to load image classifier")?;

    let advisor: Option<Arc<dyn Advisor>> = config
        .advisor
        .clone()
        .map(|c| Arc::new(ChatCompletionAdvisor::new(c)) as Arc<dyn Advisor>);
    let ocr: Option<Arc<dyn TextExtractor>> = match (&advisor, &config.advisor) {
        (Some(advisor), Some(c)) => Some(Arc::new(VisionOcr::new(
            Arc::clone(advisor),
            c.ocr_model.clone(),
        )) as Arc<dyn TextExtractor>),
        _ => None,
    };
    if advisor.is_none() {
        warn!("GROQ_API_KEY not set, all verdicts will come from fallback analysis");
    }

    let (store, catalog) = create_storage(config.database_url.as_deref()).await?;

    let authenticator = StaticTokenAuthenticator::new(config.api_tokens.clone());
    if authenticator.is_empty() {
        warn!("No API tokens configured, every authenticated route will return 401");
    }

    let desk = TriageDesk::new(
        ReportPipeline::new(classifier, advisor.clone(), ocr),
        PredictionPipeline::new(advisor),
        store,
    );

    Ok(AppState {
        desk: Arc::new(desk),
        catalog,
        authenticator: Arc::new(authenticator),
    })
}

async fn create_storage(
    database_url: Option<&str>,
) -> anyhow::Result<(Arc<dyn VerdictStore>, Arc<dyn SymptomCatalog>)> {
    match database_url {
        Some(url) => {
            let store = PostgresVerdictStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            let catalog = store.symptom_catalog();
            Ok((Arc::new(store), Arc::new(catalog)))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            Ok((
                Arc::new(InMemoryVerdictStore::new()),
                Arc::new(InMemorySymptomCatalog::new()),
            ))
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/predictions/create/", post(create_prediction))
        .route("/api/predictions/history/", get(prediction_history))
        .route("/api/predictions/stats/", get(prediction_stats))
        .route("/api/predictions/{prediction_id}/", get(prediction_detail))
        .route(
            "/api/reports/analyze/",
            post(analyze_report).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/symptoms/", get(symptom_list))
        .route("/api/symptoms/by-category/", get(symptoms_by_category))
        .route("/api/symptoms/search/", get(search_symptoms))
        .route("/api/symptoms/create-samples/", post(create_sample_symptoms))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Symptom and Report Triage Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/predictions/create/": "Predict likely conditions from symptoms",
            "GET /api/predictions/history/": "Paged prediction history, newest first",
            "GET /api/predictions/stats/": "Prediction statistics",
            "GET /api/predictions/{id}/": "Prediction detail",
            "POST /api/reports/analyze/": "Analyze an uploaded medical report (multipart)",
            "GET /api/symptoms/": "Symptom catalogue by category and name",
            "GET /api/symptoms/by-category/": "Symptoms grouped by category",
            "GET /api/symptoms/search/?q=": "Search symptoms by name",
            "POST /api/symptoms/create-samples/": "Seed the sample symptoms",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Resolves the bearer token, if any, to a user.
async fn caller(state: &AppState, headers: &HeaderMap) -> Option<UserId> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = bearer_token(header)?;
    let user = state.authenticator.authenticate(token).await;
    if user.is_none() {
        warn!("Rejected unknown bearer token");
    }
    user
}

async fn create_prediction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePredictionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PredictionRecord>), ApiError> {
    let user = caller(&state, &headers)
        .await
        .ok_or_else(|| triage_error(TriageError::AuthenticationRequired))?;
    let Json(request) = payload.map_err(|e| bad_request_error(&e.body_text()))?;

    info!(
        user = %user,
        symptoms = request.symptoms.len(),
        "Creating prediction"
    );

    let record = state
        .desk
        .create_prediction(Some(&user), request.symptoms, &request.additional_info)
        .await
        .map_err(triage_error)?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn prediction_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Page<PredictionSummary>> {
    let user = caller(&state, &headers).await;
    let page = PageRequest::new(query.page, query.page_size);

    state
        .desk
        .prediction_history(user.as_ref(), page)
        .await
        .map(Json)
        .map_err(triage_error)
}

async fn prediction_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<PredictionStats> {
    let user = caller(&state, &headers).await;

    state
        .desk
        .prediction_stats(user.as_ref())
        .await
        .map(Json)
        .map_err(triage_error)
}

async fn prediction_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(prediction_id): Path<String>,
) -> ApiResult<PredictionRecord> {
    let user = caller(&state, &headers)
        .await
        .ok_or_else(|| triage_error(TriageError::AuthenticationRequired))?;
    let id = Uuid::parse_str(&prediction_id)
        .map_err(|_| bad_request_error("Invalid prediction ID"))?;

    match state.desk.prediction(Some(&user), id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found_error("Prediction not found", &prediction_id)),
        Err(e) => Err(triage_error(e)),
    }
}

async fn analyze_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ReportAnalysisResponse>), ApiError> {
    let user = caller(&state, &headers)
        .await
        .ok_or_else(|| triage_error(TriageError::AuthenticationRequired))?;
    let upload = read_upload(multipart).await?;

    info!(
        user = %user,
        report_type = upload.report_type.as_deref().unwrap_or(""),
        files = upload.files.len(),
        "Received report upload"
    );

    let record = state
        .desk
        .analyze_report(
            Some(&user),
            upload.report_type.as_deref().unwrap_or(""),
            upload.files,
            &upload.additional_notes,
        )
        .await
        .map_err(triage_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ReportAnalysisResponse {
            verdict: record.verdict,
            report_id: record.id,
            saved_to_history: true,
        }),
    ))
}

async fn symptom_list(State(state): State<AppState>) -> ApiResult<Vec<SymptomListing>> {
    let symptoms = state.catalog.list().await.map_err(catalog_error)?;
    Ok(Json(symptoms.iter().map(|s| s.listing()).collect()))
}

async fn symptoms_by_category(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, Vec<CategoryEntry>>> {
    let symptoms = state.catalog.list().await.map_err(catalog_error)?;
    Ok(Json(group_by_category(&symptoms)))
}

async fn search_symptoms(
    State(state): State<AppState>,
    Query(query): Query<SymptomSearchQuery>,
) -> ApiResult<Vec<SymptomListing>> {
    let q = query.q.unwrap_or_default();
    if q.is_empty() {
        return Err(bad_request_error("Query parameter q is required"));
    }

    let symptoms = state.catalog.search(&q).await.map_err(catalog_error)?;
    Ok(Json(symptoms.iter().map(|s| s.listing()).collect()))
}

async fn create_sample_symptoms(State(state): State<AppState>) -> ApiResult<Value> {
    let outcome = seed_samples(state.catalog.as_ref())
        .await
        .map_err(catalog_error)?;

    Ok(Json(json!({
        "message": format!("Created {} sample symptoms", outcome.created),
        "total_symptoms": outcome.total
    })))
}

/// Collects the form: `report_type`, `additional_notes`, and every part
/// whose name starts with `file_`. Other parts are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<ReportUpload, ApiError> {
    let mut upload = ReportUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        bad_request_error(&e.body_text())
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "report_type" => {
                upload.report_type = Some(read_text(field).await?);
            }
            "additional_notes" => {
                upload.additional_notes = read_text(field).await?;
            }
            _ if is_file_part(&name) => {
                let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request_error(&e.body_text()))?;
                upload.files.push(FileBlob::new(file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(upload)
}

fn is_file_part(name: &str) -> bool {
    name.starts_with("file_")
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| bad_request_error(&e.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use tower::ServiceExt;
    use triage_core::{ClassificationResult, ClassifierError, ImageClassifier};

    const TOKEN: &str = "test-token";
    const BOUNDARY: &str = "triage-test-boundary";

    struct FixedClassifier;

    impl ImageClassifier for FixedClassifier {
        fn classify(
            &self,
            _image: &image::DynamicImage,
        ) -> Result<ClassificationResult, ClassifierError> {
            Ok(ClassificationResult {
                label: "chestmnist_pneumonia".to_string(),
                confidence: 87.5,
            })
        }
    }

    fn test_router() -> Router {
        let desk = TriageDesk::new(
            ReportPipeline::new(Arc::new(FixedClassifier), None, None),
            PredictionPipeline::new(None),
            Arc::new(InMemoryVerdictStore::new()),
        );
        build_router(AppState {
            desk: Arc::new(desk),
            catalog: Arc::new(InMemorySymptomCatalog::new()),
            authenticator: Arc::new(StaticTokenAuthenticator::new(vec![(
                TOKEN.to_string(),
                "alice".to_string(),
            )])),
        })
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", TOKEN))
    }

    fn json_request(body: Value) -> Request<Body> {
        authed("POST", "/api/predictions/create/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, image::Rgb([90, 90, 90])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn multipart_request(fields: &[(&str, &str)], files: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        authed("POST", "/api/reports/analyze/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let router = test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/api/predictions/create/")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "symptoms": ["fever"] }).to_string()))
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        let request = Request::builder()
            .uri("/api/predictions/stats/")
            .header(AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_prediction_lifecycle() {
        let router = test_router();

        let (status, created) = send(
            &router,
            json_request(json!({ "symptoms": ["Fever", "cough"], "additional_info": "3 days" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["urgency"], "low");
        assert!(created["predicted_diseases"].as_array().unwrap().len() >= 1);
        assert!(created["top_disease"]["name"].is_string());
        let id = created["id"].as_str().unwrap().to_string();

        let request = authed("GET", "/api/predictions/history/?page=1&page_size=5")
            .body(Body::empty())
            .unwrap();
        let (status, history) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["count"], 1);
        assert_eq!(history["page_size"], 5);
        assert_eq!(history["results"][0]["id"], id.as_str());

        let request = authed("GET", &format!("/api/predictions/{}/", id))
            .body(Body::empty())
            .unwrap();
        let (status, detail) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["additional_info"], "3 days");

        let request = authed("GET", "/api/predictions/stats/").body(Body::empty()).unwrap();
        let (status, stats) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_predictions"], 1);
        assert_eq!(stats["urgency_breakdown"]["low"], 1);
    }

    #[tokio::test]
    async fn test_empty_symptoms_is_bad_request() {
        let router = test_router();
        let (status, body) = send(&router, json_request(json!({ "symptoms": [" ", ""] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "symptoms");
    }

    #[tokio::test]
    async fn test_prediction_detail_errors() {
        let router = test_router();

        let request = authed("GET", "/api/predictions/not-a-uuid/")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid prediction ID");

        let request = authed("GET", &format!("/api/predictions/{}/", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analyze_image_report() {
        let router = test_router();
        let request = multipart_request(
            &[("report_type", "xray"), ("additional_notes", "dry cough")],
            &[("file_0", "chest.png", png_bytes())],
        );
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["savedToHistory"], true);
        assert!(body["reportId"].is_string());
        assert_eq!(body["reportType"], "Xray");
        assert_eq!(body["findings"][0]["finding"], "Pneumonia");
        assert_eq!(body["findings"][0]["severity"], "abnormal");
        assert_eq!(body["urgency"], "medium");
        assert_eq!(body["confidence"], 87.5);
    }

    #[tokio::test]
    async fn test_analyze_without_files_is_bad_request() {
        let router = test_router();
        let request = multipart_request(&[("report_type", "xray")], &[]);
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "files");
    }

    #[tokio::test]
    async fn test_parts_without_file_prefix_are_ignored() {
        let router = test_router();
        let request = multipart_request(
            &[("report_type", "xray")],
            &[
                ("filename", "chest.png", png_bytes()),
                ("files_meta", "meta.png", png_bytes()),
            ],
        );
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "files");

        assert!(is_file_part("file_0"));
        assert!(!is_file_part("file"));
    }

    #[tokio::test]
    async fn test_analyze_corrupt_image_is_unprocessable() {
        let router = test_router();
        let request = multipart_request(
            &[("report_type", "ct")],
            &[("file_0", "scan.png", b"not really a png".to_vec())],
        );
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_analyze_generic_report_uses_fallback() {
        let router = test_router();
        let request = multipart_request(
            &[("report_type", "dental")],
            &[("file_0", "teeth.png", png_bytes())],
        );
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["reportType"], "Dental Report");
        assert_eq!(body["urgency"], "low");
        assert_eq!(body["confidence"], 75.0);
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn seeded_router() -> Router {
        let router = test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/api/symptoms/create-samples/")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Created 8 sample symptoms");
        assert_eq!(body["total_symptoms"], 8);
        router
    }

    #[tokio::test]
    async fn test_symptom_list_is_ordered_by_category_then_name() {
        let router = seeded_router().await;
        let (status, body) = send(&router, get("/api/symptoms/")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 8);
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r["category"].as_str().unwrap(), r["name"].as_str().unwrap()))
            .collect();
        assert_eq!(pairs[0], ("Cardiovascular", "Chest Pain"));
        assert_eq!(pairs[2], ("General", "Fatigue"));
        assert_eq!(pairs[3], ("General", "Fever"));
        assert_eq!(pairs[7], ("Respiratory", "Shortness of Breath"));
        assert!(rows[0]["id"].is_string());
        assert!(rows[0].get("description").is_none());
    }

    #[tokio::test]
    async fn test_symptoms_grouped_by_category() {
        let router = seeded_router().await;
        let (status, body) = send(&router, get("/api/symptoms/by-category/")).await;
        assert_eq!(status, StatusCode::OK);

        let groups = body.as_object().unwrap();
        assert_eq!(groups.len(), 5);
        let neurological: Vec<&str> = groups["Neurological"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(neurological, vec!["Dizziness", "Headache"]);
        assert!(groups["General"][0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_symptom_search() {
        let router = seeded_router().await;
        let (status, body) = send(&router, get("/api/symptoms/search/?q=BREATH")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Shortness of Breath");

        let (_, body) = send(&router, get("/api/symptoms/search/?q=e")).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        for uri in ["/api/symptoms/search/", "/api/symptoms/search/?q="] {
            let (status, body) = send(&router, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Query parameter q is required");
        }
    }

    #[tokio::test]
    async fn test_seeding_twice_creates_nothing_new() {
        let router = seeded_router().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/symptoms/create-samples/")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Created 0 sample symptoms");
        assert_eq!(body["total_symptoms"], 8);
    }
}
