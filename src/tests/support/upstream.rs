// Test upstream server for integration tests.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::model::Record;

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    records: Vec<Record>,
    delay: Duration,
}

/// TestUpstream serves a switchable JSON record list at `/records`.
pub struct TestUpstream {
    addr: SocketAddr,
    reply: Arc<Mutex<Reply>>,
    handle: JoinHandle<()>,
}

impl TestUpstream {
    pub async fn start(records: Vec<Record>) -> Self {
        let reply = Arc::new(Mutex::new(Reply {
            status: StatusCode::OK,
            records,
            delay: Duration::ZERO,
        }));

        let app = Router::new()
            .route("/records", get(serve_records))
            .with_state(reply.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test upstream");
        let addr = listener.local_addr().expect("upstream addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            reply,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/records", self.addr)
    }

    pub fn set_records(&self, records: Vec<Record>) {
        self.reply.lock().records = records;
    }

    pub fn set_status(&self, status: StatusCode) {
        self.reply.lock().status = status;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.reply.lock().delay = delay;
    }
}

impl Drop for TestUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_records(State(reply): State<Arc<Mutex<Reply>>>) -> Response {
    let reply = reply.lock().clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    if reply.status != StatusCode::OK {
        return (reply.status, "upstream failure").into_response();
    }
    (StatusCode::OK, Json(reply.records)).into_response()
}
