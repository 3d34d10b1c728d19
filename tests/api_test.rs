use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use mockito::Matcher;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use newsletter_admin::{
    build_router,
    error::{Error, Result},
    models::{
        generated_image::{GeneratedImage, NewGeneratedImage},
        image_model::ImageModel,
        job_posting::{JobPosting, NewJobPosting},
    },
    services::{
        blob_store::LocalBlobStore,
        cover_image_service::{CoverImageService, CoverImageSettings},
        gemini_service::GeminiService,
        grok_service::GrokService,
        image_generator::ImageGenerators,
        job_import_service::JobImportService,
        job_posting_service::JobPostingStore,
        newsletter_service::{CoverImageStore, STORE_IMAGE_FAILED},
        serpapi_service::SerpApiService,
    },
    AppState,
};

#[derive(Default)]
struct MemoryJobStore {
    rows: Mutex<Vec<JobPosting>>,
}

#[async_trait]
impl JobPostingStore for MemoryJobStore {
    async fn upsert_ignore(&self, rows: &[NewJobPosting]) -> Result<u64> {
        let mut stored = self.rows.lock().unwrap();
        let mut inserted = 0;
        for row in rows {
            if stored.iter().any(|existing| existing.job_id.as_deref() == Some(row.job_id.as_str())) {
                continue;
            }
            let id = stored.len() as i64 + 1;
            stored.push(JobPosting {
                id,
                created_at: Utc::now(),
                job_id: Some(row.job_id.clone()),
                newsletter_id: None,
                title: row.title.clone(),
                company: row.company.clone(),
                location: row.location.clone(),
                apply_link: row.apply_link.clone(),
                remote: Some(row.remote),
                company_logo: row.company_logo.clone(),
                description: row.description.clone(),
                posted_date: row.posted_date,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn get_by_id(&self, id: i64) -> Result<JobPosting> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Job posting not found".to_string()))
    }

    async fn assign_to_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| Error::NotFound("Job posting not found".to_string()))?;
        row.newsletter_id = Some(newsletter_id);
        Ok(())
    }

    async fn remove_from_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .iter_mut()
            .find(|row| row.id == id && row.newsletter_id == Some(newsletter_id))
        {
            row.newsletter_id = None;
        }
        Ok(())
    }
}

#[derive(Default)]
struct MemoryNewsletters {
    covers: Mutex<HashMap<i64, Option<String>>>,
    images: Mutex<Vec<GeneratedImage>>,
    reject_writes: AtomicBool,
}

impl MemoryNewsletters {
    fn with_newsletter(id: i64) -> Self {
        let store = Self::default();
        store.covers.lock().unwrap().insert(id, None);
        store
    }

    fn cover_of(&self, id: i64) -> Option<String> {
        self.covers.lock().unwrap().get(&id).cloned().flatten()
    }
}

#[async_trait]
impl CoverImageStore for MemoryNewsletters {
    async fn newsletter_exists(&self, newsletter_id: i64) -> Result<bool> {
        Ok(self.covers.lock().unwrap().contains_key(&newsletter_id))
    }

    async fn record_image_and_set_cover(&self, image: &NewGeneratedImage) -> Result<GeneratedImage> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal(STORE_IMAGE_FAILED.to_string()));
        }
        let mut images = self.images.lock().unwrap();
        let saved = GeneratedImage {
            id: images.len() as i64 + 1,
            newsletter_id: image.newsletter_id,
            blob_url: Some(image.blob_url.clone()),
            prompt: Some(image.prompt.clone()),
            provider: Some(image.provider.clone()),
            model: Some(image.model.clone()),
            created_at: Some(Utc::now()),
        };
        images.push(saved.clone());
        self.covers
            .lock()
            .unwrap()
            .insert(image.newsletter_id, Some(image.blob_url.clone()));
        Ok(saved)
    }

    async fn find_image(&self, newsletter_id: i64, blob_url: &str) -> Result<Option<GeneratedImage>> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .find(|image| image.newsletter_id == newsletter_id && image.blob_url.as_deref() == Some(blob_url))
            .cloned())
    }

    async fn set_cover(&self, newsletter_id: i64, blob_url: &str) -> Result<()> {
        self.covers
            .lock()
            .unwrap()
            .insert(newsletter_id, Some(blob_url.to_string()));
        Ok(())
    }

    async fn list_images(&self, newsletter_id: i64) -> Result<Vec<GeneratedImage>> {
        let mut items: Vec<_> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|image| image.newsletter_id == newsletter_id)
            .cloned()
            .collect();
        items.reverse();
        Ok(items)
    }
}

struct Harness {
    app: Router,
    jobs: Arc<MemoryJobStore>,
    newsletters: Arc<MemoryNewsletters>,
    uploads: tempfile::TempDir,
}

fn harness(upstream_url: &str) -> Harness {
    let client = reqwest::Client::new();
    let jobs = Arc::new(MemoryJobStore::default());
    let newsletters = Arc::new(MemoryNewsletters::with_newsletter(1));
    let uploads = tempfile::tempdir().unwrap();

    let search = SerpApiService::new(Some("serp-key".into()), upstream_url.to_string(), client.clone());
    let job_import_service = JobImportService::new(Arc::new(search), jobs.clone());

    let generators = ImageGenerators::new(
        Arc::new(GeminiService::new(Some("g-key".into()), upstream_url.to_string(), client.clone())),
        Arc::new(GrokService::new(Some("xai-key".into()), upstream_url.to_string(), client)),
    );
    let cover_image_service = CoverImageService::new(
        generators,
        Arc::new(LocalBlobStore::new(uploads.path(), "http://localhost:8000")),
        newsletters.clone(),
        CoverImageSettings {
            default_model: ImageModel::GrokImagineImage,
            max_image_bytes: 4096,
        },
    );

    let state = AppState::from_parts(job_import_service, jobs.clone(), cover_image_service);
    let app = build_router(state, 100, &uploads.path().to_string_lossy());

    Harness {
        app,
        jobs,
        newsletters,
        uploads,
    }
}

fn json_request(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(res: &axum::response::Response) -> String {
    res.headers()[header::LOCATION].to_str().unwrap().to_string()
}

fn serp_page() -> String {
    json!({
        "jobs_results": [
            {
                "job_id": "ai-1",
                "title": "AI Enablement Lead",
                "company_name": "Acme",
                "location": "Austin, TX (+2 others)",
                "apply_options": [{ "link": "https://apply.example/ai-1" }],
                "detected_extensions": { "posted_at": "2 days ago", "schedule_type": "Full-time" }
            },
            {
                "job_id": "ai-2",
                "title": "Remote Prompt Engineer",
                "related_links": [{ "link": "https://acme.example" }]
            },
            { "job_id": "", "title": "No identifier" }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let h = harness("http://127.0.0.1:9");

    let res = h
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = h
        .app
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc = body_json(res).await;
    assert!(doc["paths"]["/api/jobs/import"].is_object());
}

#[tokio::test]
async fn json_import_is_idempotent() {
    let mut server = mockito::Server::new_async().await;
    let serp = server
        .mock("GET", "/search.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("engine".into(), "google_jobs".into()),
            Matcher::UrlEncoded("q".into(), "AI Enablement".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serp_page())
        .expect(2)
        .create_async()
        .await;

    let h = harness(&server.url());
    let payload = json!({ "q": "AI Enablement", "result_count": 10 });

    let res = h
        .app
        .clone()
        .oneshot(json_request("POST", "/api/jobs/import", payload.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["imported"], 2);
    assert_eq!(body["pages_requested"], 1);

    let res = h
        .app
        .oneshot(json_request("POST", "/api/jobs/import", payload))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["imported"], 0);

    let rows = h.jobs.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].location.as_deref(), Some("Austin, TX"));
    assert_eq!(rows[1].remote, Some(true));
    assert_eq!(rows[1].apply_link.as_deref(), Some("https://acme.example"));
    drop(rows);
    serp.assert_async().await;
}

#[tokio::test]
async fn form_import_redirects_with_outcome() {
    let mut server = mockito::Server::new_async().await;
    let _serp = server
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(serp_page())
        .create_async()
        .await;

    let h = harness(&server.url());

    let res = h
        .app
        .clone()
        .oneshot(form_request("/admin/jobs/import", "q=AI+Enablement&result_count=20"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/jobs?status=success&imported=2");

    let res = h
        .app
        .oneshot(form_request("/admin/jobs/import", "q=+++"))
        .await
        .unwrap();
    assert_eq!(
        location(&res),
        "/admin/jobs?status=error&message=Search+query+is+required"
    );
}

#[tokio::test]
async fn newsletter_import_defaults_to_today_and_checks_id() {
    let mut server = mockito::Server::new_async().await;
    let serp = server
        .mock("GET", "/search.json")
        .match_query(Matcher::UrlEncoded("chips".into(), "date_posted:today".into()))
        .with_status(200)
        .with_body(json!({ "jobs_results": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server.url());

    let res = h
        .app
        .clone()
        .oneshot(form_request("/admin/newsletters/0/jobs/import", "q=AI+Enablement"))
        .await
        .unwrap();
    assert_eq!(
        location(&res),
        "/admin/newsletters/0/jobs?status=error&message=Invalid+newsletter+id"
    );

    let res = h
        .app
        .oneshot(form_request("/admin/newsletters/1/jobs/import", "q=AI+Enablement"))
        .await
        .unwrap();
    assert_eq!(
        location(&res),
        "/admin/newsletters/1/jobs?status=success&imported=0"
    );
    serp.assert_async().await;
}

#[tokio::test]
async fn upstream_failure_is_reported_as_bad_gateway() {
    let mut server = mockito::Server::new_async().await;
    let _serp = server
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let h = harness(&server.url());
    let res = h
        .app
        .oneshot(json_request("POST", "/api/jobs/import", json!({ "q": "AI Enablement" })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(res).await["error"], "SerpAPI request failed (500)");
    assert!(h.jobs.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn jobs_can_be_added_and_removed() {
    let mut server = mockito::Server::new_async().await;
    let _serp = server
        .mock("GET", "/search.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(serp_page())
        .create_async()
        .await;

    let h = harness(&server.url());
    h.app
        .clone()
        .oneshot(json_request("POST", "/api/jobs/import", json!({ "q": "AI Enablement" })))
        .await
        .unwrap();

    let res = h
        .app
        .clone()
        .oneshot(Request::post("/api/newsletters/1/jobs/2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["newsletter_id"], 1);

    let res = h
        .app
        .clone()
        .oneshot(Request::post("/api/newsletters/1/jobs/0").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Invalid job id");

    let res = h
        .app
        .clone()
        .oneshot(Request::post("/api/newsletters/1/jobs/99").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = h
        .app
        .oneshot(Request::delete("/api/newsletters/1/jobs/2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(h.jobs.rows.lock().unwrap()[1].newsletter_id, None);
}

#[tokio::test]
async fn image_model_catalog_marks_default() {
    let h = harness("http://127.0.0.1:9");
    let res = h
        .app
        .oneshot(Request::get("/api/image-models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(res).await;
    assert_eq!(body["default_key"], "grok-imagine-image");
    assert_eq!(body["models"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn generated_cover_is_stored_and_can_be_reselected() {
    let mut server = mockito::Server::new_async().await;
    let grok = server
        .mock("POST", "/images/generations")
        .match_header("authorization", "Bearer xai-key")
        .with_status(200)
        .with_body(json!({ "data": [{ "b64_json": STANDARD.encode(b"first-cover") }] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server.url());

    let res = h
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/newsletters/1/cover-image/generate",
            json!({ "prompt": "robots reading a newspaper" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let url = body["cover_image"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost:8000/uploads/newsletters/1/cover-"));
    assert_eq!(body["image"]["provider"], "grok");
    grok.assert_async().await;

    let stored = url.trim_start_matches("http://localhost:8000/uploads/");
    assert_eq!(std::fs::read(h.uploads.path().join(stored)).unwrap(), b"first-cover");
    assert_eq!(h.newsletters.cover_of(1).as_deref(), Some(url.as_str()));

    h.newsletters.set_cover(1, "https://elsewhere/x.png").await.unwrap();
    let res = h
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/newsletters/1/cover-image",
            json!({ "cover_url": url }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(h.newsletters.cover_of(1).as_deref(), Some(url.as_str()));

    let res = h
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/newsletters/1/cover-image",
            json!({ "cover_url": "https://elsewhere/x.png" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["error"],
        "Selected image is not associated with this newsletter"
    );

    let res = h
        .app
        .oneshot(Request::get("/api/newsletters/1/images").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(res).await["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_model_never_reaches_a_provider() {
    let mut server = mockito::Server::new_async().await;
    let grok = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let h = harness(&server.url());
    let res = h
        .app
        .oneshot(json_request(
            "POST",
            "/api/newsletters/1/cover-image/generate",
            json!({ "prompt": "robots", "image_model": "dall-e-3" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Invalid image model selected");
    grok.assert_async().await;
}

#[tokio::test]
async fn oversized_generation_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _gemini = server
        .mock("POST", "/models/gemini-2.5-flash-image:generateContent")
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{ "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(vec![0u8; 8192]) } }
                ]}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let h = harness(&server.url());
    let res = h
        .app
        .oneshot(json_request(
            "POST",
            "/api/newsletters/1/cover-image/generate",
            json!({ "prompt": "robots", "image_model": "gemini-flash-image" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.newsletters.cover_of(1), None);
    assert!(std::fs::read_dir(h.uploads.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn failed_save_reports_the_storage_message_and_removes_the_file() {
    let mut server = mockito::Server::new_async().await;
    let _grok = server
        .mock("POST", "/images/generations")
        .with_status(200)
        .with_body(json!({ "data": [{ "b64_json": STANDARD.encode(b"cover") }] }).to_string())
        .create_async()
        .await;

    let h = harness(&server.url());
    h.newsletters.reject_writes.store(true, Ordering::SeqCst);

    let res = h
        .app
        .oneshot(json_request(
            "POST",
            "/api/newsletters/1/cover-image/generate",
            json!({ "prompt": "robots" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(res).await["error"],
        "Failed to store generated newsletter image"
    );
    assert_eq!(h.newsletters.cover_of(1), None);
    let dir = h.uploads.path().join("newsletters/1");
    assert_eq!(std::fs::read_dir(dir).unwrap().count(), 0);
}
