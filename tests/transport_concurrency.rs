//! Concurrent requests against one capture host

use futures::future::join_all;
use std::sync::Arc;
use websketch_capture::dom::memory::{MemoryDocument, MemoryElement};
use websketch_capture::{
    CaptureHost, CaptureRequest, Limits, LimitsProvider, MemoryStore, PartialLimits,
};

fn grid(rows: usize, cells: usize) -> MemoryDocument {
    let mut body = MemoryElement::new("BODY");
    for r in 0..rows {
        let mut row = MemoryElement::new("DIV").with_id(format!("row{}", r));
        for c in 0..cells {
            row.add_child(MemoryElement::new("SPAN").with_text(format!("{}:{}", r, c)));
        }
        body.add_child(row);
    }
    MemoryDocument::new(MemoryElement::new("HTML").with_child(body))
        .with_url("https://example.com/grid")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_independent() {
    let host = CaptureHost::spawn(|| Ok(grid(10, 10)), Arc::new(Limits::default()))
        .await
        .unwrap();

    let requests = (0..16).map(|_| {
        let host = host.clone();
        async move { host.handle(CaptureRequest::CapturePage).await }
    });
    let responses = join_all(requests).await;

    assert_eq!(responses.len(), 16);
    for response in &responses {
        assert!(response.success);
        let snapshot = response.capture.as_ref().unwrap();
        assert_eq!(snapshot.node_count(), 112);
        assert!(snapshot.warnings.is_none());
    }
    host.close().await.unwrap();
}

#[tokio::test]
async fn test_persist_between_requests_applies_to_next_capture() {
    let provider = Arc::new(LimitsProvider::new(MemoryStore::new()));
    let host = CaptureHost::spawn(|| Ok(grid(10, 10)), provider.clone())
        .await
        .unwrap();

    let before = host.handle(CaptureRequest::CapturePage).await.capture.unwrap();
    assert_eq!(before.node_count(), 112);

    provider
        .persist(&PartialLimits::default().with_max_nodes(5))
        .unwrap();

    let after = host.handle(CaptureRequest::CapturePage).await.capture.unwrap();
    assert_eq!(after.node_count(), 5);
    // each capture keeps its own warnings
    assert!(before.warnings.is_none());
    assert_eq!(
        after.warnings.unwrap(),
        vec![
            "Node limit (5) reached in DIV#row0: 8 siblings skipped".to_string(),
            "Node limit (5) reached in BODY#?: 9 siblings skipped".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_mixed_json_messages() {
    let host = CaptureHost::spawn(|| Ok(grid(2, 2)), Arc::new(Limits::default()))
        .await
        .unwrap();

    let messages = [
        r#"{"type":"CAPTURE_PAGE"}"#,
        r#"{"type":"OPEN_OPTIONS"}"#,
        r#"{"type":"CAPTURE_PAGE"}"#,
        "",
    ];
    let replies = join_all(messages.iter().map(|m| host.handle_json(m))).await;
    let ok: Vec<bool> = replies
        .iter()
        .map(|r| serde_json::from_str::<serde_json::Value>(r).unwrap()["success"] == true)
        .collect();
    assert_eq!(ok, vec![true, false, true, false]);
}
