use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::usecases::release_expired_holds::{
    ReleaseExpiredHoldsParams, ReleaseExpiredHoldsUseCase, SweepError,
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/deposit-holds/release" \
//     -H "Authorization: Bearer $INTERNAL_SWEEP_TOKEN" \
//     -H "Content-Type: application/json" \
//     -d '{"dry_run":true}'

#[derive(Clone)]
pub struct DepositHoldsRouteState {
    internal_token: Option<String>,
    usecase: Arc<ReleaseExpiredHoldsUseCase>,
}

pub fn routes(internal_token: Option<String>, usecase: Arc<ReleaseExpiredHoldsUseCase>) -> Router {
    Router::new()
        .route("/release", post(release_deposit_holds))
        .with_state(DepositHoldsRouteState {
            internal_token,
            usecase,
        })
}

#[derive(Debug, Default, Deserialize)]
pub struct ReleaseDepositHoldsRequest {
    pub dry_run: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ReleaseDepositHoldsResponse {
    pub cutoff: DateTime<Utc>,
    pub released: usize,
    pub bookings_expired: usize,
    pub dry_run: bool,
    pub released_ids: Vec<Uuid>,
}

pub async fn release_deposit_holds(
    State(state): State<DepositHoldsRouteState>,
    headers: HeaderMap,
    payload: Option<Json<ReleaseDepositHoldsRequest>>,
) -> Response {
    let expected_token = match state.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "sweep token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let params = ReleaseExpiredHoldsParams {
        dry_run: payload.dry_run.unwrap_or(false),
    };

    match state.usecase.run(params).await {
        Ok(result) => Json(ReleaseDepositHoldsResponse {
            cutoff: result.cutoff,
            released: result.released,
            bookings_expired: result.bookings_expired,
            dry_run: result.dry_run,
            released_ids: result.released_ids,
        })
        .into_response(),
        Err(SweepError::Disabled) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "deposit hold ttl is not configured",
        )
            .into_response(),
        Err(SweepError::StoreUnavailable(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "release failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::release_expired_holds::HoldPolicy;
    use axum::{body::Body, http::Request};
    use crates::domain::repositories::{
        bookings::MockBookingRepository, slots::MockSlotRepository,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn router(token: Option<&str>, slot_repo: MockSlotRepository) -> Router {
        let usecase = ReleaseExpiredHoldsUseCase::new(
            Arc::new(slot_repo),
            Arc::new(MockBookingRepository::new()),
            HoldPolicy {
                ttl_minutes: Some(30),
                grace_minutes: 10,
            },
        );
        routes(token.map(str::to_string), Arc::new(usecase))
    }

    fn release_request(auth: Option<&str>, body: &'static str) -> Request<Body> {
        let mut request = Request::post("/release").header("content-type", "application/json");
        if let Some(auth) = auth {
            request = request.header(AUTHORIZATION, auth);
        }
        request.body(Body::from(body)).unwrap()
    }

    #[test]
    fn bearer_must_match_exactly() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            authorize_bearer(&headers, "secret"),
            Err(StatusCode::UNAUTHORIZED)
        );

        headers.insert(AUTHORIZATION, "Bearer secret".parse().unwrap());
        assert_eq!(authorize_bearer(&headers, "secret"), Ok(()));

        headers.insert(AUTHORIZATION, "Basic secret".parse().unwrap());
        assert_eq!(
            authorize_bearer(&headers, "secret"),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn unconfigured_token_disables_the_endpoint() {
        let response = router(None, MockSlotRepository::new())
            .oneshot(release_request(Some("Bearer anything"), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let mut slot_repo = MockSlotRepository::new();
        slot_repo.expect_release_expired_holds().never();

        let response = router(Some("secret"), slot_repo)
            .oneshot(release_request(Some("Bearer guess"), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authorized_dry_run_reports_candidates() {
        let candidate = Uuid::new_v4();
        let mut slot_repo = MockSlotRepository::new();
        slot_repo
            .expect_release_expired_holds()
            .withf(|_, dry_run| *dry_run)
            .times(1)
            .returning(move |_, _| Box::pin(async move { Ok(vec![candidate]) }));

        let response = router(Some("secret"), slot_repo)
            .oneshot(release_request(Some("Bearer secret"), r#"{"dry_run":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["released"], 1);
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["released_ids"][0], candidate.to_string());
    }
}
