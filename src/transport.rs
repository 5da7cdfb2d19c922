//! Message transport between a caller and the document being captured.
//!
//! A [`CaptureHost`] owns its document on a dedicated worker thread, so
//! documents that are not `Send` (such as a parsed `scraper::Html`) can still
//! be captured from async code. Callers send a [`CaptureRequest`] and get a
//! [`CaptureResponse`] back; every failure is folded into the response.

use crate::dom::Document;
use crate::limits::{Limits, LimitsSource};
use crate::{walker, Capture, Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

/// Messages understood by the capture host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaptureRequest {
    #[serde(rename = "CAPTURE_PAGE")]
    CapturePage,
}

/// Reply to a [`CaptureRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<Capture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResponse {
    pub fn ok(capture: Capture) -> Self {
        Self {
            success: true,
            capture: Some(capture),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            capture: None,
            error: Some(error.into()),
        }
    }

    pub fn from_result(result: Result<Capture>) -> Self {
        match result {
            Ok(capture) => Self::ok(capture),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

enum Command {
    Capture(Limits, oneshot::Sender<Result<Capture>>),
    Close(oneshot::Sender<()>),
}

/// Async capture endpoint backed by a worker thread that owns the document.
///
/// Limits are resolved for every request, so changes persisted between two
/// requests take effect on the second one.
#[derive(Clone)]
pub struct CaptureHost {
    cmd_tx: Sender<Command>,
    limits: Arc<dyn LimitsSource>,
    /// Taken by the first `close`
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CaptureHost {
    /// Spawn the worker and build the document on it with `make_document`.
    pub async fn spawn<D, F>(make_document: F, limits: Arc<dyn LimitsSource>) -> Result<Self>
    where
        D: Document + 'static,
        F: FnOnce() -> Result<D> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        let worker = thread::spawn(move || {
            let document = match make_document() {
                Ok(document) => document,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Capture(limits, resp) => {
                        let _ = resp.send(walker::capture(&document, &limits));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
            log::debug!("Capture worker stopped");
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self {
            cmd_tx,
            limits,
            worker: Arc::new(Mutex::new(Some(worker))),
        })
    }

    /// Resolve the current limits and capture the document with them
    pub async fn capture_page(&self) -> Result<Capture> {
        let source = Arc::clone(&self.limits);
        let limits = tokio::task::spawn_blocking(move || source.resolve())
            .await
            .map_err(|e| Error::Other(format!("Limits resolution panicked: {}", e)))??;

        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Capture(limits, tx))
            .map_err(|_| Error::NoCaptureTarget("capture host has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Capture canceled: {}", e)))?
    }

    /// Answer one request
    pub async fn handle(&self, request: CaptureRequest) -> CaptureResponse {
        match request {
            CaptureRequest::CapturePage => {
                log::debug!("Handling CAPTURE_PAGE");
                let result = self.capture_page().await;
                if let Err(ref err) = result {
                    log::warn!("Capture failed: {}", err);
                }
                CaptureResponse::from_result(result)
            }
        }
    }

    /// Answer a raw JSON message with a JSON response
    pub async fn handle_json(&self, message: &str) -> String {
        let response = match serde_json::from_str::<CaptureRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Unsupported message {}: {}", message, e);
                CaptureResponse::failure(format!("Unsupported message: {}", e))
            }
        };
        encode_response(&response)
    }

    /// Stop the worker and join its thread.
    ///
    /// The document is dropped before this returns. Closing a host that
    /// another clone already closed is a no-op.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(tx)).is_ok() {
            // a worker that exited between send and recv drops `tx`
            let _ = rx.await;
        }

        let worker = self
            .worker
            .lock()
            .map_err(|e| Error::Other(format!("Worker handle poisoned: {}", e)))?
            .take();
        if let Some(worker) = worker {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| Error::Other(format!("Join task failed: {}", e)))?
                .map_err(|_| Error::Other("Capture worker panicked".into()))?;
            log::debug!("Capture worker joined");
        }
        Ok(())
    }
}

fn encode_response(response: &CaptureResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        let fallback = CaptureResponse::failure(format!("Failed to encode response: {}", e));
        serde_json::to_string(&fallback)
            .unwrap_or_else(|_| r#"{"success":false,"error":"Failed to encode response"}"#.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemoryDocument, MemoryElement};
    use crate::limits::{LimitsProvider, PartialLimits};
    use crate::settings::MemoryStore;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FailingLimits;

    impl LimitsSource for FailingLimits {
        fn resolve(&self) -> Result<Limits> {
            Err(Error::StorageError("quota exceeded".into()))
        }
    }

    /// Wraps a document and records when the worker drops it
    struct Tracked {
        inner: MemoryDocument,
        dropped: Arc<AtomicBool>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl Document for Tracked {
        type Element<'a> = &'a MemoryElement;

        fn root_element(&self) -> Option<&MemoryElement> {
            self.inner.root_element()
        }

        fn url(&self) -> String {
            self.inner.url()
        }

        fn title(&self) -> String {
            self.inner.title()
        }

        fn viewport(&self) -> crate::Viewport {
            self.inner.viewport()
        }
    }

    fn page() -> MemoryDocument {
        let root = MemoryElement::new("HTML").with_child(
            MemoryElement::new("BODY")
                .with_child(MemoryElement::new("P").with_text("one"))
                .with_child(MemoryElement::new("P").with_text("two")),
        );
        MemoryDocument::new(root)
            .with_url("https://example.com/")
            .with_title("Example")
    }

    #[tokio::test]
    async fn test_capture_page_success() {
        let host = CaptureHost::spawn(|| Ok(page()), Arc::new(Limits::default()))
            .await
            .unwrap();
        let response = host.handle(CaptureRequest::CapturePage).await;
        assert!(response.success);
        assert!(response.error.is_none());

        let capture = response.capture.unwrap();
        assert_eq!(capture.root.element_type, "HTML");
        assert_eq!(capture.metadata.title, "Example");
        assert_eq!(capture.node_count(), 4);
        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_detached_document_fails() {
        let host = CaptureHost::spawn(|| Ok(MemoryDocument::detached()), Arc::new(Limits::default()))
            .await
            .unwrap();
        let response = host.handle(CaptureRequest::CapturePage).await;
        assert!(!response.success);
        assert!(response.capture.is_none());
        assert!(response.error.unwrap().contains("No capture target"));
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_capture() {
        let host = CaptureHost::spawn(|| Ok(page()), Arc::new(FailingLimits))
            .await
            .unwrap();
        let response = host.handle(CaptureRequest::CapturePage).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_document_factory_error_is_returned() {
        let result = CaptureHost::spawn(
            || -> Result<MemoryDocument> { Err(Error::LoadError("boom".into())) },
            Arc::new(Limits::default()),
        )
        .await;
        assert!(matches!(result, Err(Error::LoadError(_))));
    }

    #[tokio::test]
    async fn test_limits_resolved_per_request() {
        let provider = Arc::new(LimitsProvider::new(MemoryStore::new()));
        let host = CaptureHost::spawn(|| Ok(page()), provider.clone()).await.unwrap();

        let first = host.capture_page().await.unwrap();
        assert!(!first.is_truncated());

        provider.persist(&PartialLimits::default().with_max_depth(1)).unwrap();
        let second = host.capture_page().await.unwrap();
        assert!(second.is_truncated());
        assert_eq!(second.node_count(), 2);
    }

    #[tokio::test]
    async fn test_handle_json_wire_shape() {
        let host = CaptureHost::spawn(|| Ok(page()), Arc::new(Limits::default()))
            .await
            .unwrap();

        let reply: Value = serde_json::from_str(&host.handle_json(r#"{"type":"CAPTURE_PAGE"}"#).await).unwrap();
        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["capture"]["root"]["type"], json!("HTML"));
        assert!(reply.get("error").is_none());

        let reply: Value = serde_json::from_str(&host.handle_json(r#"{"type":"PING"}"#).await).unwrap();
        assert_eq!(reply["success"], json!(false));
        assert!(reply["error"].as_str().unwrap().starts_with("Unsupported message"));

        let reply: Value = serde_json::from_str(&host.handle_json("not json").await).unwrap();
        assert_eq!(reply["success"], json!(false));
    }

    #[tokio::test]
    async fn test_closed_host_reports_failure() {
        let host = CaptureHost::spawn(|| Ok(page()), Arc::new(Limits::default()))
            .await
            .unwrap();
        let other = host.clone();
        host.close().await.unwrap();

        let response = other.handle(CaptureRequest::CapturePage).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_close_joins_the_worker() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();
        let host = CaptureHost::spawn(
            move || {
                Ok(Tracked {
                    inner: page(),
                    dropped: flag,
                })
            },
            Arc::new(Limits::default()),
        )
        .await
        .unwrap();
        let other = host.clone();

        assert!(host.capture_page().await.is_ok());
        assert!(!dropped.load(Ordering::SeqCst));

        host.close().await.unwrap();
        assert!(dropped.load(Ordering::SeqCst));

        // already closed through a clone
        other.close().await.unwrap();
    }
}
