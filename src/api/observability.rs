use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header::USER_AGENT},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                "Metrics not enabled or failed to initialize".to_string(),
            )
        },
        |handle| (StatusCode::OK, handle.render()),
    )
}

/// Wraps each API call in a `request` span and reports it once it finishes.
/// The caller middleware fills in `user_id` when a token resolves.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let path = req.uri().path().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned());
    // Unmatched paths share one label so 404 scans cannot blow up the series count.
    let route_label = route.clone().unwrap_or_else(|| "unmatched".to_owned());
    let resource = resource_of(route.as_deref().unwrap_or(&path));
    let method = req.method().clone();
    let client = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        %method,
        %path,
        route = route.as_deref(),
        resource,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let labels = [
            ("resource", resource.to_owned()),
            ("method", method.to_string()),
            ("route", route_label),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("foodgram_api_requests_total", &labels).increment(1);
        metrics::histogram!("foodgram_api_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        if status.is_server_error() {
            warn!(
                event = "api_request_failed",
                status = status.as_u16(),
                elapsed_ms,
                client = %client,
                "{resource} request failed"
            );
        } else {
            info!(
                event = "api_request_finished",
                status = status.as_u16(),
                elapsed_ms,
                client = %client,
                "{resource} request finished"
            );
        }

        response
    }
    .instrument(span)
    .await
}

/// First segment under `/api` (`recipes`, `users`, `ingredients`, `auth`),
/// or `media` / `other` for everything served outside it.
fn resource_of(path: &str) -> &'static str {
    let Some(rest) = path.strip_prefix("/api/") else {
        return if path.starts_with("/media") { "media" } else { "other" };
    };

    match rest.split('/').next() {
        Some("recipes") => "recipes",
        Some("users") => "users",
        Some("ingredients") => "ingredients",
        Some("auth") => "auth",
        Some("metrics") => "metrics",
        _ => "other",
    }
}
