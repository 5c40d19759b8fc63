//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metric_exporter::http::{MetricExporter, ServerSettings};
use metric_exporter::lifecycle::{ReadySignal, ServerState, Shutdown};
use metric_exporter::{ExporterError, Fetcher, UpstreamSet};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Start a mock upstream that answers every request with `body` after `delay`.
pub async fn start_mock_upstream(body: &'static str, delay: Duration) -> SocketAddr {
    start_programmable_upstream(move || async move {
        tokio::time::sleep(delay).await;
        (200, body.to_string())
    })
    .await
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 2048];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn metrics_url(addr: SocketAddr) -> String {
    format!("http://{}/metrics", addr)
}

/// A running exporter and the handles a test needs to drive it.
pub struct RunningExporter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub ready: ReadySignal,
    pub state: watch::Receiver<ServerState>,
    pub handle: JoinHandle<Result<(), ExporterError>>,
}

impl RunningExporter {
    pub fn url(&self) -> String {
        metrics_url(self.addr)
    }
}

/// Serve `exporter` on an ephemeral port and wait until it is listening.
pub async fn spawn_exporter<F: Fetcher>(exporter: MetricExporter<F>) -> RunningExporter {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let ready = exporter.ready_signal();
    let mut state = exporter.state();
    let handle = tokio::spawn(exporter.serve(listener, shutdown.subscribe()));

    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| *s == ServerState::Listening),
    )
    .await
    .expect("exporter did not start listening")
    .unwrap();

    RunningExporter {
        addr,
        shutdown,
        ready,
        state,
        handle,
    }
}

pub fn settings(grace_period: Duration) -> ServerSettings {
    ServerSettings {
        bind_address: "127.0.0.1:0".into(),
        grace_period,
    }
}

pub fn upstream_set(entries: &[(&str, String)]) -> UpstreamSet {
    entries
        .iter()
        .map(|(name, url)| (name.to_string(), url.clone()))
        .collect()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber writing to this sink for the current thread.
    ///
    /// Only sees tasks on the test's own thread, so pair it with the default
    /// current-thread `#[tokio::test]` runtime.
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
