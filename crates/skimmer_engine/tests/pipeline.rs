use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use skimmer_engine::{
    DirStorageTarget, FetchSettings, FinalizedFile, PipelineEvent, PipelineSettings, ProgressSink,
    ReqwestFetcher, TransferPipeline,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn file(name: &str, url: String) -> FinalizedFile {
    FinalizedFile {
        name: name.to_string(),
        url,
    }
}

fn no_param_settings() -> PipelineSettings {
    PipelineSettings {
        raw_fetch_param: None,
        ..PipelineSettings::default()
    }
}

#[tokio::test]
async fn batch_runs_in_order_and_isolates_failures() {
    batch_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"alpha".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"gamma!".to_vec()))
        .mount(&server)
        .await;

    let files = vec![
        file("a.pdf", format!("{}/a.pdf", server.uri())),
        file("missing.pdf", format!("{}/missing.pdf", server.uri())),
        file("c.bin", format!("{}/c.bin", server.uri())),
    ];

    let temp = TempDir::new().unwrap();
    let storage = DirStorageTarget::new(temp.path());
    let pipeline = TransferPipeline::new(
        ReqwestFetcher::new(FetchSettings::default()),
        no_param_settings(),
    );
    let sink = TestSink::default();

    let result = pipeline.run(&files, &storage, &sink).await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.fail_count, 1);
    assert_eq!(result.success_count + result.fail_count, files.len());

    assert_eq!(fs::read(temp.path().join("a.pdf")).unwrap(), b"alpha");
    assert_eq!(fs::read(temp.path().join("c.bin")).unwrap(), b"gamma!");
    // The failed item left neither a final file nor a partial one.
    assert!(!temp.path().join("missing.pdf").exists());
    assert!(!temp.path().join("missing.pdf.part").exists());

    let events = sink.take();
    assert_eq!(
        events,
        vec![
            PipelineEvent::TransferStarted { total: 3 },
            PipelineEvent::ItemStarted {
                index: 0,
                name: "a.pdf".to_string()
            },
            PipelineEvent::ItemSucceeded {
                name: "a.pdf".to_string(),
                bytes: 5
            },
            PipelineEvent::ItemStarted {
                index: 1,
                name: "missing.pdf".to_string()
            },
            PipelineEvent::ItemFailed {
                name: "missing.pdf".to_string(),
                reason: "HTTP 404 - Not Found".to_string()
            },
            PipelineEvent::ItemStarted {
                index: 2,
                name: "c.bin".to_string()
            },
            PipelineEvent::ItemSucceeded {
                name: "c.bin".to_string(),
                bytes: 6
            },
            PipelineEvent::BatchComplete {
                succeeded: 2,
                failed: 1
            },
        ]
    );
}

/// Serves canned payloads keyed by URL and records the order of requests.
struct FakeFetcher {
    payloads: Vec<(String, Vec<u8>)>,
    requested: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl skimmer_engine::Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<skimmer_engine::FetchedBody, skimmer_engine::TransferError> {
        self.requested.lock().unwrap().push(url.to_string());
        let payload = self
            .payloads
            .iter()
            .find(|(known, _)| known == url)
            .map(|(_, bytes)| bytes.clone())
            .ok_or(skimmer_engine::TransferError::HttpStatus {
                status: 404,
                reason: "Not Found".to_string(),
            })?;
        Ok(skimmer_engine::FetchedBody::from_bytes(payload))
    }
}

#[tokio::test]
async fn attempt_order_matches_the_finalized_order() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let fetcher = FakeFetcher {
        payloads: vec![
            ("https://h/b.bin".to_string(), b"bee".to_vec()),
            ("https://h/a.bin".to_string(), b"ay".to_vec()),
        ],
        requested: requested.clone(),
    };

    // Deliberately not alphabetical: the resolver's order is the law.
    let files = vec![
        file("b.bin", "https://h/b.bin".to_string()),
        file("a.bin", "https://h/a.bin".to_string()),
    ];
    let temp = TempDir::new().unwrap();
    let storage = DirStorageTarget::new(temp.path());
    let pipeline = TransferPipeline::new(fetcher, no_param_settings());
    let sink = TestSink::default();

    let result = pipeline.run(&files, &storage, &sink).await;

    assert_eq!(result.success_count, 2);
    assert_eq!(
        *requested.lock().unwrap(),
        vec!["https://h/b.bin", "https://h/a.bin"]
    );
    assert_eq!(fs::read(temp.path().join("b.bin")).unwrap(), b"bee");
    assert_eq!(fs::read(temp.path().join("a.bin")).unwrap(), b"ay");
}

#[tokio::test]
async fn forced_download_parameter_is_appended() {
    let server = MockServer::start().await;
    // Only the forced variant of the URL serves bytes.
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .and(query_param("download", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let files = vec![file("doc.pdf", format!("{}/doc.pdf", server.uri()))];
    let temp = TempDir::new().unwrap();
    let storage = DirStorageTarget::new(temp.path());
    let pipeline = TransferPipeline::new(
        ReqwestFetcher::new(FetchSettings::default()),
        PipelineSettings::default(),
    );
    let sink = TestSink::default();

    let result = pipeline.run(&files, &storage, &sink).await;

    assert_eq!(result.success_count, 1);
    assert_eq!(fs::read(temp.path().join("doc.pdf")).unwrap(), b"raw");
}

#[tokio::test]
async fn delay_applies_between_items_but_not_after_the_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let files = vec![
        file("one.bin", format!("{}/one.bin", server.uri())),
        file("two.bin", format!("{}/two.bin", server.uri())),
    ];
    let temp = TempDir::new().unwrap();
    let storage = DirStorageTarget::new(temp.path());
    let pipeline = TransferPipeline::new(
        ReqwestFetcher::new(FetchSettings::default()),
        PipelineSettings {
            delay_between_files: Duration::from_millis(100),
            raw_fetch_param: None,
        },
    );
    let sink = TestSink::default();

    let start = Instant::now();
    let result = pipeline.run(&files, &storage, &sink).await;
    let elapsed = start.elapsed();

    assert_eq!(result.success_count, 2);
    // One inter-item pause, not two.
    assert!(elapsed >= Duration::from_millis(100));
}

#[tokio::test]
async fn every_item_fails_still_produces_a_full_tally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let files = vec![
        file("a.bin", format!("{}/a.bin", server.uri())),
        file("b.bin", format!("{}/b.bin", server.uri())),
    ];
    let temp = TempDir::new().unwrap();
    let storage = DirStorageTarget::new(temp.path());
    let pipeline = TransferPipeline::new(
        ReqwestFetcher::new(FetchSettings::default()),
        no_param_settings(),
    );
    let sink = TestSink::default();

    let result = pipeline.run(&files, &storage, &sink).await;

    assert_eq!(result.success_count, 0);
    assert_eq!(result.fail_count, 2);
    let events = sink.take();
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::BatchComplete {
            succeeded: 0,
            failed: 2
        })
    );
}
