use axum::http::StatusCode;
use axum::Router;
use jitlab_common::CREATE_ELAPSED_HEADER;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

const READY_TIMEOUT: Duration = Duration::from_secs(30);

/// An in-process HTTP endpoint standing in for the workload server.
///
/// Runs on its own thread with its own tokio runtime, so the blocking load driver can
/// be called from a plain `#[test]`. The thread lives until the test process exits.
pub struct TestTarget {
    pub addr: SocketAddr,
    hits: Arc<AtomicU64>,
}

impl TestTarget {
    /// Answer every request with `status` after `delay`.
    pub fn fixed(delay: Duration, status: StatusCode) -> Self {
        Self::spawn(move |hits| {
            Router::new().fallback(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(delay).await;
                    status
                }
            })
        })
    }

    /// Accept requests and never answer them in any reasonable time.
    pub fn hanging() -> Self {
        Self::fixed(Duration::from_secs(3600), StatusCode::OK)
    }

    /// Answer 200 with a zip-sized body and a fixed `X-Create-Elapsed-Ms` header.
    pub fn files(create_elapsed_ms: u64) -> Self {
        Self::spawn(move |hits| {
            Router::new().fallback(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::Relaxed);
                    (
                        StatusCode::OK,
                        [(CREATE_ELAPSED_HEADER, create_elapsed_ms.to_string())],
                        vec![0u8; 4096],
                    )
                }
            })
        })
    }

    fn spawn(make_router: impl FnOnce(Arc<AtomicU64>) -> Router + Send + 'static) -> Self {
        let hits = Arc::new(AtomicU64::new(0));
        let router = make_router(Arc::clone(&hits));
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build target runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("failed to bind target");
                ready_tx.send(listener.local_addr().expect("target has no local address")).ok();
                axum::serve(listener, router).await.ok();
            });
        });

        let addr = ready_rx
            .recv_timeout(READY_TIMEOUT)
            .expect("target did not start within 30 seconds");
        Self { addr, hits }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests that reached a handler so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}
