use super::*;
use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

/// Optional access control in front of the room API.
///
/// The default is fully open: no token and no rate limit, so every valid
/// command a client sends is queued.
#[derive(Clone, Default)]
pub struct ApiSecurity {
    pub required_token: Option<String>,
    limiter: Option<RateLimiter>,
}

impl ApiSecurity {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn new(required_token: Option<String>, rate_limit_per_sec: Option<u32>) -> Self {
        Self {
            required_token,
            limiter: rate_limit_per_sec
                .filter(|limit| *limit > 0)
                .map(RateLimiter::per_second),
        }
    }

    /// `ROOM_API_TOKEN` turns on the token check, `ROOM_API_RATE_LIMIT_PER_SEC`
    /// the per-client limit. Unset or empty leaves either off.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let rate_limit = read("ROOM_API_RATE_LIMIT_PER_SEC").and_then(|v| match v.parse() {
            Ok(limit) => Some(limit),
            Err(_) => {
                warn!("[Room API] ignoring ROOM_API_RATE_LIMIT_PER_SEC={v:?}");
                None
            }
        });
        Self::new(read("ROOM_API_TOKEN"), rate_limit)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), GuardError> {
        let Some(expected) = self.required_token.as_deref() else {
            return Ok(());
        };
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);
        let bearer = header("authorization").and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        });
        if bearer == Some(expected) || header("x-api-key") == Some(expected) {
            Ok(())
        } else {
            Err(GuardError::Unauthorized)
        }
    }
}

/// Fixed one-second windows counted per client address.
#[derive(Clone)]
struct RateLimiter {
    limit: u32,
    windows: Arc<Mutex<HashMap<IpAddr, (Instant, u32)>>>,
}

const RATE_WINDOW: Duration = Duration::from_secs(1);
const MAX_TRACKED_CLIENTS: usize = 4096;

impl RateLimiter {
    fn per_second(limit: u32) -> Self {
        Self {
            limit,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn admit(&self, client: IpAddr, now: Instant) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if windows.len() >= MAX_TRACKED_CLIENTS {
            windows.retain(|_, (start, _)| now.duration_since(*start) < RATE_WINDOW);
        }
        let (start, count) = windows.entry(client).or_insert((now, 0));
        if now.duration_since(*start) >= RATE_WINDOW {
            *start = now;
            *count = 0;
        }
        *count += 1;
        *count <= self.limit
    }
}

#[derive(Debug, thiserror::Error)]
enum GuardError {
    #[error("missing or invalid API token")]
    Unauthorized,
    #[error("too many requests from {0}")]
    RateLimited(IpAddr),
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GuardError::Unauthorized => (StatusCode::UNAUTHORIZED, CODE_UNAUTHORIZED),
            GuardError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, CODE_RATE_LIMITED),
        };
        warn!("[Room API] rejected request: {self}");
        (status, Json(CmdResponse::rejected(code, self.to_string()))).into_response()
    }
}

/// Peer address of the connection; requests built in-process have none.
fn client_of(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub(super) async fn api_guard(
    State(security): State<ApiSecurity>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(e) = security.authorize(req.headers()) {
        return e.into_response();
    }
    if let Some(limiter) = &security.limiter {
        let client = client_of(&req);
        if !limiter.admit(client, Instant::now()) {
            return GuardError::RateLimited(client).into_response();
        }
    }
    next.run(req).await
}
