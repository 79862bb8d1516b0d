//! Rendering engine backed by a Gotenberg service (headless Chromium behind
//! an HTTP API). One engine per service endpoint; each context tags its
//! requests with its own trace id so concurrent jobs are distinguishable in
//! the service logs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};
use uuid::Uuid;

use crate::render::{EngineLauncher, PageConfig, RenderContext, RenderEngine, RenderError};

const CONVERT_HTML_PATH: &str = "/forms/chromium/convert/html";
const HEALTH_PATH: &str = "/health";
const TRACE_HEADER: &str = "Gotenberg-Trace";

/// Launches engines against a Gotenberg base URL, checking it is healthy first.
#[derive(Clone)]
pub struct GotenbergLauncher {
    client: Client,
    base_url: String,
}

impl GotenbergLauncher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RenderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RenderError::Launch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EngineLauncher for GotenbergLauncher {
    async fn launch(&self) -> Result<Arc<dyn RenderEngine>, RenderError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, HEALTH_PATH))
            .send()
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RenderError::Launch(format!(
                "render service unhealthy (status {})",
                response.status()
            )));
        }

        info!("Rendering engine ready at {}", self.base_url);
        Ok(Arc::new(GotenbergEngine {
            client: self.client.clone(),
            convert_url: format!("{}{}", self.base_url, CONVERT_HTML_PATH),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

pub struct GotenbergEngine {
    client: Client,
    convert_url: String,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl RenderEngine for GotenbergEngine {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RenderError::EngineClosed);
        }
        let trace = Uuid::new_v4();
        debug!("Opened rendering context {trace}");
        Ok(Box::new(GotenbergContext {
            client: self.client.clone(),
            convert_url: self.convert_url.clone(),
            engine_closed: Arc::clone(&self.closed),
            trace,
            open: true,
        }))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.closed.store(true, Ordering::SeqCst);
        debug!("Rendering engine closed");
        Ok(())
    }
}

struct GotenbergContext {
    client: Client,
    convert_url: String,
    engine_closed: Arc<AtomicBool>,
    trace: Uuid,
    open: bool,
}

impl GotenbergContext {
    fn form(html: &str, page: &PageConfig) -> Result<Form, RenderError> {
        let index = Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html")
            .map_err(|e| RenderError::Engine(e.to_string()))?;
        Ok(Self::page_fields(page)
            .into_iter()
            .fold(Form::new().part("files", index), |form, (name, value)| {
                form.text(name, value)
            }))
    }

    /// Paper geometry form fields, in inches.
    fn page_fields(page: &PageConfig) -> Vec<(&'static str, String)> {
        let (width, height) = page.format.size_inches();
        vec![
            ("paperWidth", width.to_string()),
            ("paperHeight", height.to_string()),
            ("marginTop", page.margins.top.to_string()),
            ("marginRight", page.margins.right.to_string()),
            ("marginBottom", page.margins.bottom.to_string()),
            ("marginLeft", page.margins.left.to_string()),
            ("printBackground", "true".to_string()),
            ("preferCssPageSize", "true".to_string()),
        ]
    }
}

#[async_trait]
impl RenderContext for GotenbergContext {
    async fn render(&mut self, html: &str, page: &PageConfig) -> Result<Bytes, RenderError> {
        if !self.open {
            return Err(RenderError::Engine("context is closed".to_string()));
        }
        if self.engine_closed.load(Ordering::SeqCst) {
            return Err(RenderError::EngineClosed);
        }

        let response = self
            .client
            .post(&self.convert_url)
            .header(TRACE_HEADER, self.trace.to_string())
            .multipart(Self::form(html, page)?)
            .send()
            .await
            .map_err(|e| RenderError::Engine(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Engine(format!("status {status}: {body}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| RenderError::Engine(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.open = false;
        debug!("Closed rendering context {}", self.trace);
        Ok(())
    }
}
