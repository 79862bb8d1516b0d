use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::document::{render_html, DocumentModel};
use crate::render::{EngineLauncher, PageConfig, RenderContext, RenderEngine, RenderError, RenderedArtifact};

/// Who closes the engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Engine supplied by the caller (one per batch); the caller closes it.
    Shared,
    /// Engine launched for a single job; the pool closes it.
    Owned,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub opened: usize,
    pub released: usize,
}

/// A borrowed rendering context. Call `release` when done; if the lease is
/// dropped instead (panic, cancellation) the context is closed on the runtime
/// in the background.
pub struct ContextLease {
    context: Option<Box<dyn RenderContext>>,
    counters: Arc<Counters>,
}

impl ContextLease {
    pub async fn render(&mut self, html: &str, page: &PageConfig) -> Result<Bytes, RenderError> {
        match self.context.as_mut() {
            Some(context) => context.render(html, page).await,
            None => Err(RenderError::Engine("context already released".to_string())),
        }
    }

    pub async fn release(mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.close().await {
                warn!("Failed to close rendering context: {e}");
            }
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let Some(mut context) = self.context.take() else {
            return;
        };
        warn!("Rendering context dropped without release, closing in background");
        let counters = Arc::clone(&self.counters);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = context.close().await {
                        warn!("Failed to close rendering context: {e}");
                    }
                    counters.released.fetch_add(1, Ordering::SeqCst);
                });
            }
            Err(_) => error!("No runtime available to close a leaked rendering context"),
        }
    }
}

/// Hands out rendering contexts against one engine instance.
pub struct RenderPool {
    engine: Arc<dyn RenderEngine>,
    mode: EngineMode,
    render_timeout: Duration,
    counters: Arc<Counters>,
    engine_closed: AtomicBool,
}

impl RenderPool {
    /// Wraps a caller-owned engine. The pool never closes it.
    pub fn shared(engine: Arc<dyn RenderEngine>, render_timeout: Duration) -> Self {
        Self::new(engine, EngineMode::Shared, render_timeout)
    }

    /// Launches a private engine for one job. Call `shutdown` when the job is
    /// done; dropping the pool without it closes the engine in the background.
    pub async fn launch_owned(
        launcher: &dyn EngineLauncher,
        render_timeout: Duration,
    ) -> Result<Self, RenderError> {
        let engine = launcher.launch().await?;
        debug!("Launched owned rendering engine");
        Ok(Self::new(engine, EngineMode::Owned, render_timeout))
    }

    fn new(engine: Arc<dyn RenderEngine>, mode: EngineMode, render_timeout: Duration) -> Self {
        Self {
            engine,
            mode,
            render_timeout,
            counters: Arc::new(Counters::default()),
            engine_closed: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            opened: self.counters.opened.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
        }
    }

    pub async fn borrow_context(&self) -> Result<ContextLease, RenderError> {
        let context = self.engine.new_context().await?;
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ContextLease {
            context: Some(context),
            counters: Arc::clone(&self.counters),
        })
    }

    /// Renders one document in a freshly borrowed context. The context is
    /// released whether rendering succeeds, fails, times out, or panics.
    pub async fn render(
        &self,
        doc: &DocumentModel,
        page: &PageConfig,
    ) -> Result<RenderedArtifact, RenderError> {
        let mut lease = self.borrow_context().await?;

        let outcome = AssertUnwindSafe(async {
            let html = render_html(doc, page);
            tokio::time::timeout(self.render_timeout, lease.render(&html, page)).await
        })
        .catch_unwind()
        .await;

        lease.release().await;

        match outcome {
            Ok(Ok(Ok(bytes))) => Ok(RenderedArtifact::new(bytes)),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_elapsed)) => Err(RenderError::Timeout(self.render_timeout)),
            Err(_panic) => Err(RenderError::Panicked),
        }
    }

    /// Launches an owned engine, renders one document, and closes the engine
    /// on every path.
    pub async fn render_owned(
        launcher: &dyn EngineLauncher,
        render_timeout: Duration,
        doc: &DocumentModel,
        page: &PageConfig,
    ) -> Result<RenderedArtifact, RenderError> {
        let pool = Self::launch_owned(launcher, render_timeout).await?;
        let result = pool.render(doc, page).await;
        pool.shutdown().await;
        result
    }

    /// Closes the engine if this pool owns it. No-op in shared mode.
    pub async fn shutdown(self) {
        if self.mode == EngineMode::Owned && !self.engine_closed.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.engine.close().await {
                error!("Failed to close owned rendering engine: {e}");
            }
        }
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        if self.mode != EngineMode::Owned || self.engine_closed.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!("Owned rendering engine dropped without shutdown, closing in background");
        let engine = Arc::clone(&self.engine);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = engine.close().await {
                        error!("Failed to close owned rendering engine: {e}");
                    }
                });
            }
            Err(_) => error!("No runtime available to close a leaked rendering engine"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PageFormat;
    use crate::testing::{FakeEngine, FakeLauncher, FakeRender};

    fn doc(marker: &str) -> DocumentModel {
        DocumentModel {
            header: Some(crate::document::model::Header {
                full_name: marker.to_string(),
                contact_lines: vec![],
            }),
            sections: vec![],
        }
    }

    fn page() -> PageConfig {
        PageConfig::for_format(PageFormat::A4)
    }

    #[tokio::test]
    async fn test_successful_render_releases_context() {
        let engine = FakeEngine::new(1024);
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_secs(5));

        let artifact = pool.render(&doc("ok"), &page()).await.unwrap();

        assert_eq!(artifact.size, 1024);
        assert_eq!(pool.stats(), PoolStats { opened: 1, released: 1 });
        assert_eq!(engine.stats().contexts_opened, 1);
        assert_eq!(engine.stats().contexts_closed, 1);
        assert_eq!(engine.stats().engine_closes, 0, "shared engine must stay open");
    }

    #[tokio::test]
    async fn test_engine_error_releases_context() {
        let engine = FakeEngine::new(1024).with_rule("explode", FakeRender::Fail("gpu lost".into()));
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_secs(5));

        let err = pool.render(&doc("explode"), &page()).await.unwrap_err();

        assert!(err.to_string().contains("gpu lost"));
        assert_eq!(engine.stats().contexts_closed, 1);
    }

    #[tokio::test]
    async fn test_timeout_releases_context() {
        let engine = FakeEngine::new(1024).with_rule("slow", FakeRender::Hang);
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_millis(50));

        let err = pool.render(&doc("slow"), &page()).await.unwrap_err();

        assert!(matches!(err, RenderError::Timeout(_)));
        assert_eq!(engine.stats().contexts_closed, 1);
    }

    #[tokio::test]
    async fn test_panic_during_render_releases_context() {
        let engine = FakeEngine::new(1024).with_rule("crash", FakeRender::Panic);
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_secs(5));

        let err = pool.render(&doc("crash"), &page()).await.unwrap_err();

        assert!(matches!(err, RenderError::Panicked));
        assert_eq!(engine.stats().contexts_closed, 1);
    }

    #[tokio::test]
    async fn test_dropped_lease_is_closed_in_background() {
        let engine = FakeEngine::new(1024);
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_secs(5));

        let lease = pool.borrow_context().await.unwrap();
        drop(lease);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(engine.stats().contexts_closed, 1);
        assert_eq!(pool.stats(), PoolStats { opened: 1, released: 1 });
    }

    #[tokio::test]
    async fn test_owned_mode_closes_engine_after_success() {
        let engine = FakeEngine::new(2048);
        let launcher = FakeLauncher::new(engine.clone());

        let artifact = RenderPool::render_owned(&launcher, Duration::from_secs(5), &doc("ok"), &page())
            .await
            .unwrap();

        assert_eq!(artifact.size, 2048);
        assert_eq!(launcher.launches(), 1);
        assert_eq!(engine.stats().engine_closes, 1);
        assert_eq!(engine.stats().contexts_closed, 1);
    }

    #[tokio::test]
    async fn test_owned_mode_closes_engine_after_failure() {
        let engine = FakeEngine::new(2048).with_rule("explode", FakeRender::Fail("bad html".into()));
        let launcher = FakeLauncher::new(engine.clone());

        let result =
            RenderPool::render_owned(&launcher, Duration::from_secs(5), &doc("explode"), &page()).await;

        assert!(result.is_err());
        assert_eq!(engine.stats().engine_closes, 1);
        assert_eq!(engine.stats().contexts_closed, 1);
    }

    #[tokio::test]
    async fn test_shared_shutdown_does_not_close_engine() {
        let engine = FakeEngine::new(16);
        let pool = RenderPool::shared(Arc::new(engine.clone()), Duration::from_secs(5));
        assert_eq!(pool.mode(), EngineMode::Shared);
        pool.shutdown().await;
        assert_eq!(engine.stats().engine_closes, 0);
    }

    #[tokio::test]
    async fn test_dropped_owned_pool_closes_engine_in_background() {
        let engine = FakeEngine::new(16);
        let launcher = FakeLauncher::new(engine.clone());
        let pool = RenderPool::launch_owned(&launcher, Duration::from_secs(5)).await.unwrap();
        drop(pool);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.stats().engine_closes, 1);
    }
}
