use super::*;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";

#[derive(Clone)]
pub struct BridgeConfig {
    pub bind_addr: String,
    /// How long `CommandBridge::start` waits for the listener to bind.
    pub ready_timeout: Duration,
    /// How long in-flight requests may keep the listener alive after a stop.
    pub shutdown_grace: Duration,
    pub security: ApiSecurity,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ready_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(2),
            security: ApiSecurity::open(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to build listener runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("listener did not come up within {0:?}")]
    NotReady(Duration),
}

/// Owns the HTTP listener thread that feeds the task queue.
///
/// `start` returns only after the listener has bound (or failed to), and
/// dropping the bridge stops the listener and joins its thread, so no handler
/// can run once the owner is gone.
#[derive(Resource)]
pub struct CommandBridge {
    local_addr: SocketAddr,
    stop: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CommandBridge {
    pub(crate) fn start(config: BridgeConfig, state: AppState) -> Result<Self, BridgeError> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        // Created before the thread exists, so stopping is valid at any point
        // of the listener's startup.
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
        let router = build_router(state, config.security.clone());
        let bind_addr = config.bind_addr.clone();
        let grace = config.shutdown_grace;

        let thread = std::thread::Builder::new()
            .name("room-api".to_string())
            .spawn(move || run_listener(bind_addr, router, grace, ready_tx, stop_rx))
            .map_err(BridgeError::Spawn)?;

        let readiness = ready_rx.recv_timeout(config.ready_timeout);
        let result = match readiness {
            Ok(Ok(local_addr)) => {
                return Ok(Self {
                    local_addr,
                    stop: Some(stop_tx),
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BridgeError::NotReady(config.ready_timeout)),
        };

        let _ = stop_tx.send(());
        if thread.join().is_err() {
            warn!("[Room API] listener thread panicked during startup");
        }
        result
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop serving and wait for the listener thread. Requests already being
    /// handled get `shutdown_grace` to finish; connections still open after
    /// that are dropped. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("[Room API] listener thread panicked");
            } else {
                info!("[Room API] stopped listening on {}", self.local_addr);
            }
        }
    }
}

impl Drop for CommandBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_listener(
    bind_addr: String,
    router: Router,
    grace: Duration,
    ready: crossbeam_channel::Sender<Result<SocketAddr, BridgeError>>,
    stop: tokio::sync::oneshot::Receiver<()>,
) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready.send(Err(BridgeError::Runtime(e)));
            return;
        }
    };

    rt.block_on(async move {
        let bound = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener.local_addr().map(|addr| (listener, addr)),
            Err(e) => Err(e),
        };
        let (listener, addr) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                let _ = ready.send(Err(BridgeError::Bind {
                    addr: bind_addr,
                    source,
                }));
                return;
            }
        };
        let _ = ready.send(Ok(addr));

        let (draining_tx, draining_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            // A dropped sender also means stop.
            let _ = stop.await;
            let _ = draining_tx.send(());
        })
        .into_future();

        tokio::select! {
            served = server => {
                if let Err(e) = served {
                    warn!("[Room API] server error: {e}");
                }
            }
            _ = async move {
                if draining_rx.await.is_ok() {
                    tokio::time::sleep(grace).await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {
                warn!("[Room API] dropping connections still open after {grace:?}");
            }
        }
    });
    // Connection tasks left behind by an expired grace period die here.
    rt.shutdown_timeout(Duration::from_millis(100));
}
