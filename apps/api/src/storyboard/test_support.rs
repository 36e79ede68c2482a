//! Shared fixtures for storyboard tests: tiny PNGs, text-only input PDFs, a
//! stub image API bound to a loopback port, and an output PDF inspector.

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use serde_json::{json, Value};

pub fn png_sized(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn png_1x1() -> Vec<u8> {
    png_sized(1, 1)
}

/// Writes a one-page PDF with each paragraph in its own text block, spaced far
/// enough apart vertically that text extraction emits a blank line between them.
pub fn write_text_pdf(path: &Path, paragraphs: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut operations = Vec::new();
    for (i, text) in paragraphs.iter().enumerate() {
        let y = 760 - 250 * i as i64;
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(*text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations }.encode().unwrap();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter([(
                "Font",
                Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
            )])),
        ),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

/// What a test needs to know about one page of a written storyboard.
#[derive(Debug)]
pub struct PageSummary {
    pub image_count: usize,
    pub content: String,
    pub media_box: [f32; 4],
}

pub fn page_summaries(path: &Path) -> Vec<PageSummary> {
    summarize(Document::load(path).unwrap())
}

pub fn page_summaries_from_bytes(bytes: &[u8]) -> Vec<PageSummary> {
    summarize(Document::load_mem(bytes).unwrap())
}

fn summarize(doc: Document) -> Vec<PageSummary> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let image_count = resources
                .get(b"XObject")
                .and_then(Object::as_dict)
                .map(|d| d.len())
                .unwrap_or(0);
            let media_box: Vec<f32> = page
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| match o {
                    Object::Integer(i) => *i as f32,
                    Object::Real(r) => *r as f32,
                    other => panic!("unexpected MediaBox entry {other:?}"),
                })
                .collect();
            let content = doc.get_page_content(page_id).unwrap();
            PageSummary {
                image_count,
                content: String::from_utf8_lossy(&content).into_owned(),
                media_box: [media_box[0], media_box[1], media_box[2], media_box[3]],
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Stub image API
// ────────────────────────────────────────────────────────────────────────────

struct StubState {
    base_url: String,
    fail_on_call: Option<usize>,
    prompts: Mutex<Vec<String>>,
    fetches: AtomicUsize,
}

/// In-process stand-in for both the generation API and the host serving the
/// generated images. Every prompt yields the same 1×1 PNG.
pub struct StubImageService {
    state: Arc<StubState>,
}

impl StubImageService {
    pub async fn start() -> Self {
        Self::spawn(None).await
    }

    /// The generation call with this zero-based index answers 500.
    pub async fn failing_on(call_index: usize) -> Self {
        Self::spawn(Some(call_index)).await
    }

    async fn spawn(fail_on_call: Option<usize>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let state = Arc::new(StubState {
            base_url: format!("http://{addr}"),
            fail_on_call,
            prompts: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/v1/images/generations", post(generations))
            .route("/images/scene.png", get(scene_png))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state }
    }

    pub fn base_url(&self) -> String {
        self.state.base_url.clone()
    }

    /// Base URL to hand the generation client.
    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.state.base_url)
    }

    pub fn image_url(&self) -> String {
        format!("{}/images/scene.png", self.state.base_url)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.fetches.load(Ordering::SeqCst)
    }
}

async fn generations(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    assert_eq!(body["n"], 1);
    assert_eq!(body["size"], "1024x1024");

    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    let index = {
        let mut prompts = state.prompts.lock().unwrap();
        prompts.push(prompt);
        prompts.len() - 1
    };

    if state.fail_on_call == Some(index) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "stub generation failure" } })),
        )
            .into_response();
    }

    Json(json!({
        "created": 0,
        "data": [{ "url": format!("{}/images/scene.png", state.base_url) }]
    }))
    .into_response()
}

async fn scene_png(State(state): State<Arc<StubState>>) -> impl IntoResponse {
    state.fetches.fetch_add(1, Ordering::SeqCst);
    ([("content-type", "image/png")], png_1x1())
}
