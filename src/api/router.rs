use super::*;

pub(super) fn build_router(state: AppState, security: ApiSecurity) -> Router {
    Router::new()
        .route("/cmd", post(post_cmd))
        .route("/state", get(get_state))
        .with_state(state)
        .layer(middleware::from_fn_with_state(security, api_guard))
}
