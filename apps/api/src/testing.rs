//! In-memory collaborators for tests. State lives behind `Arc` so a clone
//! handed to the code under test can be inspected afterwards.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::artifact::storage::object_key;
use crate::artifact::job_store::StoreError;
use crate::artifact::{JobStore, ObjectStore, UploadError};
use crate::llm_client::LlmError;
use crate::models::job::{Job, JobField};
use crate::pipeline::analyze::{AnalysisError, JobAnalysis, JobAnalyzer};
use crate::pipeline::optimize::{ContentRewriter, RewriteError};
use crate::render::{EngineLauncher, PageConfig, RenderContext, RenderEngine, RenderError};

// ────────────────────────────────────────────────────────────────────────────
// Rendering engine
// ────────────────────────────────────────────────────────────────────────────

/// Behaviour of a render whose HTML contains a rule's needle.
#[derive(Debug, Clone)]
pub enum FakeRender {
    Fail(String),
    Hang,
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    pub engine_closes: usize,
    pub peak_open: usize,
}

#[derive(Default)]
struct EngineState {
    artifact_size: usize,
    delay_ms: AtomicU64,
    rules: Mutex<Vec<(String, FakeRender)>>,
    rendered: Mutex<Vec<String>>,
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    open_now: AtomicUsize,
    peak_open: AtomicUsize,
    engine_closes: AtomicUsize,
    closed: AtomicBool,
}

#[derive(Clone)]
pub struct FakeEngine {
    state: Arc<EngineState>,
}

impl FakeEngine {
    /// Every successful render yields `artifact_size` bytes.
    pub fn new(artifact_size: usize) -> Self {
        Self {
            state: Arc::new(EngineState {
                artifact_size,
                ..EngineState::default()
            }),
        }
    }

    pub fn with_rule(self, needle: &str, render: FakeRender) -> Self {
        self.state
            .rules
            .lock()
            .unwrap()
            .push((needle.to_string(), render));
        self
    }

    /// Holds each render for `delay` so concurrent jobs overlap.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
        self
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            contexts_opened: self.state.contexts_opened.load(Ordering::SeqCst),
            contexts_closed: self.state.contexts_closed.load(Ordering::SeqCst),
            engine_closes: self.state.engine_closes.load(Ordering::SeqCst),
            peak_open: self.state.peak_open.load(Ordering::SeqCst),
        }
    }

    /// HTML of every render attempt, in call order.
    pub fn rendered_html(&self) -> Vec<String> {
        self.state.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(RenderError::EngineClosed);
        }
        self.state.contexts_opened.fetch_add(1, Ordering::SeqCst);
        let open = self.state.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.engine_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeContext {
    state: Arc<EngineState>,
    closed: bool,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn render(&mut self, html: &str, _page: &PageConfig) -> Result<Bytes, RenderError> {
        if self.closed {
            return Err(RenderError::EngineClosed);
        }
        self.state.rendered.lock().unwrap().push(html.to_string());

        let delay = self.state.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let rule = self
            .state
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| html.contains(needle.as_str()))
            .map(|(_, render)| render.clone());

        match rule {
            Some(FakeRender::Fail(message)) => Err(RenderError::Engine(message)),
            Some(FakeRender::Hang) => std::future::pending().await,
            Some(FakeRender::Panic) => panic!("fake engine crashed"),
            None => Ok(Bytes::from(vec![b'%'; self.state.artifact_size])),
        }
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if !self.closed {
            self.closed = true;
            self.state.contexts_closed.fetch_add(1, Ordering::SeqCst);
            self.state.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    engine: FakeEngine,
    launches: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(engine: FakeEngine) -> Self {
        Self {
            engine,
            launches: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// Every launch attempt fails, as when the render service is down.
    pub fn failing(engine: FakeEngine) -> Self {
        Self {
            fail: true,
            ..Self::new(engine)
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn RenderEngine>, RenderError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::Launch("render service unreachable".to_string()));
        }
        Ok(Arc::new(self.engine.clone()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AI collaborators
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeAnalyzer {
    failing: HashSet<Uuid>,
    panicking: HashSet<Uuid>,
}

impl FakeAnalyzer {
    pub fn failing_for(mut self, job_id: Uuid) -> Self {
        self.failing.insert(job_id);
        self
    }

    pub fn panicking_for(mut self, job_id: Uuid) -> Self {
        self.panicking.insert(job_id);
        self
    }
}

#[async_trait]
impl JobAnalyzer for FakeAnalyzer {
    async fn analyze(&self, job: &Job) -> Result<JobAnalysis, AnalysisError> {
        if self.panicking.contains(&job.id) {
            panic!("analyzer crashed on job {}", job.id);
        }
        if self.failing.contains(&job.id) {
            return Err(AnalysisError::Llm(LlmError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            }));
        }
        Ok(JobAnalysis {
            key_sentences: vec![format!("Own the {} roadmap.", job.title)],
            keywords: vec!["Rust".to_string(), "Kafka".to_string()],
        })
    }
}

/// Echoes the source as a bullet plus a keyword bullet. Sources containing a
/// `failing_on` needle fail.
#[derive(Clone, Default)]
pub struct FakeRewriter {
    failing: Vec<String>,
    sources: Arc<Mutex<Vec<String>>>,
}

impl FakeRewriter {
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.sources.lock().unwrap().len()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentRewriter for FakeRewriter {
    async fn rewrite(&self, source_text: &str, keywords: &[String]) -> Result<String, RewriteError> {
        self.sources.lock().unwrap().push(source_text.to_string());
        if self.failing.iter().any(|needle| source_text.contains(needle.as_str())) {
            return Err(RewriteError::Llm(LlmError::RateLimited { retries: 3 }));
        }
        let focus = keywords.first().map(String::as_str).unwrap_or("impact");
        Ok(format!("- {source_text}\n- Focused on **{focus}**"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeObjectStore {
    fail: bool,
}

impl FakeObjectStore {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put(&self, filename: &str, _bytes: Bytes, _content_type: &str) -> Result<String, UploadError> {
        let key = object_key(filename);
        if self.fail {
            return Err(UploadError::Rejected {
                key,
                message: "bucket unavailable".to_string(),
            });
        }
        Ok(format!("https://cdn.test/{key}"))
    }
}

/// Records successful updates; columns marked failing return a database error.
#[derive(Clone, Default)]
pub struct FakeJobStore {
    failing: Vec<&'static str>,
    updates: Arc<Mutex<Vec<(Uuid, JobField)>>>,
}

impl FakeJobStore {
    pub fn failing_column(mut self, column: &'static str) -> Self {
        self.failing.push(column);
        self
    }

    pub fn updates(&self) -> Vec<(Uuid, JobField)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for FakeJobStore {
    async fn update_field(&self, job_id: Uuid, field: JobField) -> Result<(), StoreError> {
        if self.failing.contains(&field.column()) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.updates.lock().unwrap().push((job_id, field));
        Ok(())
    }
}
