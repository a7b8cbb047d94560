use reqwest::StatusCode;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::app::{App, HttpServer};
use crate::cache::SnapshotCache;
use crate::config::new_test_config;
use crate::controller::init_prometheus_exporter;
use crate::model::Record;
use crate::shutdown::GracefulShutdown;
use crate::source::{DataSource, FetchError, HttpSource};
use crate::tests::support::{records, refresh, ScriptedSource, Step, TestUpstream};

const HOUR: Duration = Duration::from_secs(3600);

struct Running {
    base: String,
    token: CancellationToken,
    gsh: Arc<GracefulShutdown>,
    app: App,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn stop(self) {
        self.token.cancel();
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.gsh.pending() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("app closed");
    }
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, addr)
}

async fn start_app(source: Arc<ScriptedSource<Record>>) -> Running {
    let mut cfg = new_test_config();
    cfg.cache.refresh = refresh(HOUR, HOUR, 2);

    let token = CancellationToken::new();
    let gsh = Arc::new(GracefulShutdown::new(token.clone()));
    let app = App::with_source(token.clone(), cfg, source).expect("app");

    let (listener, addr) = bind().await;
    app.serve_on(listener, gsh.clone()).await.expect("serve");

    Running {
        base: format!("http://{}", addr),
        token,
        gsh,
        app,
    }
}

#[tokio::test]
async fn records_are_served_from_the_snapshot() {
    let source = ScriptedSource::<Record>::fixed(records(3));
    let running = start_app(source.clone()).await;

    let resp = reqwest::get(running.url("/api/v1/records")).await.expect("get");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let body: Vec<Record> = resp.json().await.expect("json");
    assert_eq!(body, records(3));

    let resp = reqwest::get(running.url("/api/v1/records/2")).await.expect("get");
    assert_eq!(resp.status(), StatusCode::OK);
    let record: Record = resp.json().await.expect("json");
    assert_eq!(record, Record::new("2", "data-2"));

    let resp = reqwest::get(running.url("/api/v1/records/404")).await.expect("get");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Reads never reach the source.
    assert_eq!(source.calls(), 1);

    running.stop().await;
}

#[tokio::test]
async fn manual_refresh_and_snapshot_meta() {
    let source = ScriptedSource::<Record>::new(vec![Step::Ok(records(1))], Step::Ok(records(5)));
    let running = start_app(source.clone()).await;
    let client = reqwest::Client::new();

    let meta: Value = client
        .get(running.url("/snapcache/snapshot"))
        .send()
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(meta["state"], "running");
    assert_eq!(meta["version"], 1);
    assert_eq!(meta["records"], 1);
    assert_eq!(meta["delay_secs"], 3600.0);

    let resp = client
        .post(running.url("/snapcache/refresh"))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(5), source.wait_finished(2))
        .await
        .expect("refreshed");

    let meta: Value = client
        .get(running.url("/snapcache/snapshot"))
        .send()
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(meta["version"], 2);
    assert_eq!(meta["records"], 5);
    assert_eq!(meta["successes"], 2);
    assert!(meta["refreshed_at"].is_string());

    running.stop().await;
}

#[tokio::test]
async fn probe_tracks_the_refresher() {
    let source = ScriptedSource::<Record>::fixed(records(1));
    let running = start_app(source).await;

    let resp = reqwest::get(running.url("/k8s/probe")).await.expect("get");
    assert_eq!(resp.status(), StatusCode::OK);

    let cache = running.app.cache();
    let base = running.base.clone();
    running.stop().await;
    assert!(!cache.is_running());

    // The listener is gone once the app is closed.
    assert!(reqwest::get(format!("{}/k8s/probe", base)).await.is_err());
}

#[tokio::test]
async fn probe_fails_once_the_refresher_dies() {
    let source = ScriptedSource::<Record>::new(vec![Step::Ok(records(1))], Step::Panic);
    let running = start_app(source.clone()).await;
    let client = reqwest::Client::new();

    let resp = client.get(running.url("/k8s/probe")).send().await.expect("get");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(running.url("/snapcache/refresh"))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let resp = client.get(running.url("/k8s/probe")).send().await.expect("get");
            if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("probe reports the dead refresher");

    let resp = client.post(running.url("/snapcache/refresh")).send().await.expect("post");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(source.calls(), 2);

    running.stop().await;
}

#[tokio::test]
async fn idle_cache_answers_503() {
    let source = ScriptedSource::<Record>::fixed(records(1));
    let cache = SnapshotCache::new(refresh(HOUR, HOUR, 2), source.clone());
    let token = CancellationToken::new();
    let server = HttpServer::new(token.clone(), &new_test_config(), cache).expect("server");

    let (listener, addr) = bind().await;
    let serving = tokio::spawn(async move { server.serve(listener).await });
    let base = format!("http://{}", addr);

    for path in ["/k8s/probe", "/api/v1/records", "/api/v1/records/1", "/snapcache/snapshot"] {
        let resp = reqwest::get(format!("{base}{path}")).await.expect("get");
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
    }
    let resp = reqwest::Client::new()
        .post(format!("{base}/snapcache/refresh"))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(source.calls(), 0);

    token.cancel();
    serving.await.expect("join").expect("serve");
}

#[tokio::test]
async fn metrics_expose_refresh_counters() {
    // Another test may have installed the recorder already.
    let _ = init_prometheus_exporter();

    let source = ScriptedSource::<Record>::new(vec![Step::Ok(records(2))], Step::Fail);
    let running = start_app(source.clone()).await;

    let resp = reqwest::get(running.url("/metrics")).await.expect("get");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("text");
    assert!(body.contains("refresh_success_total"), "{body}");
    assert!(body.contains("snapshot_records"), "{body}");

    running.stop().await;
}

#[tokio::test]
async fn http_source_reads_upstream_records() {
    let upstream = TestUpstream::start(records(4)).await;
    let source = HttpSource::<Record>::new(&upstream.url(), Duration::from_secs(2)).expect("source");

    assert_eq!(source.fetch_all().await.expect("fetch"), records(4));

    upstream.set_records(records(1));
    assert_eq!(source.fetch_all().await.expect("fetch"), records(1));
}

#[tokio::test]
async fn http_source_maps_upstream_failures() {
    let upstream = TestUpstream::start(records(1)).await;
    let source = HttpSource::<Record>::new(&upstream.url(), Duration::from_millis(200)).expect("source");

    upstream.set_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(source.fetch_all().await, Err(FetchError::Status(500))));

    upstream.set_status(axum::http::StatusCode::OK);
    upstream.set_delay(Duration::from_secs(2));
    assert!(matches!(source.fetch_all().await, Err(FetchError::Timeout(_))));
}

#[tokio::test]
async fn http_source_reports_unreachable_upstream() {
    let (listener, addr) = bind().await;
    drop(listener);

    let source =
        HttpSource::<Record>::new(&format!("http://{}/records", addr), Duration::from_secs(2))
            .expect("source");
    assert!(matches!(source.fetch_all().await, Err(FetchError::Unavailable(_))));
}
