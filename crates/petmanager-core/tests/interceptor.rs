mod common;

use common::{empty_page, ok_json, status, token_gate, Harness};
use petmanager_core::api::ListQuery;
use petmanager_core::auth::{RefreshPolicy, REFRESH_TOKEN_KEY};
use petmanager_core::http::{ApiRequest, Transport};
use petmanager_core::ApiError;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::json;

const PETS: &str = "/v1/pets";
const REFRESH: &str = "/autenticacao/refresh";

#[tokio::test]
async fn test_attaches_bearer_token() {
    let h = Harness::new(|_: &ApiRequest| ok_json(empty_page()));
    h.store_tokens(Some("A1"), None);

    h.client.pets().list(&ListQuery::default()).await.unwrap();

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization(), Some("Bearer A1"));
}

#[tokio::test]
async fn test_forwards_unmodified_without_token() {
    let h = Harness::new(|_: &ApiRequest| ok_json(empty_page()));

    h.client.pets().list(&ListQuery::default()).await.unwrap();

    assert_eq!(h.transport.requests()[0].authorization(), None);
}

#[tokio::test]
async fn test_login_endpoint_never_carries_authorization() {
    let h = Harness::new(|_: &ApiRequest| ok_json(json!({"access_token": "A1"})));
    h.store_tokens(Some("STALE"), Some("R1"));

    let request = ApiRequest::post_json(
        "https://api.test/autenticacao/login",
        &json!({"username": "u", "password": "p"}),
    )
    .unwrap()
    .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer CALLER"));

    h.client.execute(request).await.unwrap();

    assert_eq!(h.transport.requests()[0].authorization(), None);
}

#[tokio::test]
async fn test_login_401_through_pipeline_is_not_refreshed() {
    let h = Harness::new(|_: &ApiRequest| status(StatusCode::UNAUTHORIZED));
    h.store_tokens(Some("A1"), Some("R1"));

    let request = ApiRequest::post_json("https://api.test/autenticacao/login", &json!({})).unwrap();
    let err = h.client.execute(request).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn test_retries_once_with_refreshed_token() {
    let h = Harness::new(token_gate("A2"));
    h.store_tokens(Some("A1"), Some("R1"));

    let page = h.client.pets().list(&ListQuery::default()).await.unwrap();
    assert!(page.is_empty());

    let protected = h.transport.requests_to(PETS);
    assert_eq!(protected.len(), 2);
    assert_eq!(protected[0].authorization(), Some("Bearer A1"));
    assert_eq!(protected[1].authorization(), Some("Bearer A2"));
    assert_eq!(h.transport.requests_to(REFRESH).len(), 1);

    assert_eq!(h.session.token().as_deref(), Some("A2"));
    assert_eq!(h.stored(REFRESH_TOKEN_KEY).as_deref(), Some("R2"));
    assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn test_retry_is_sent_after_refresh_response() {
    let h = Harness::new(token_gate("A2"));
    h.store_tokens(Some("A1"), Some("R1"));

    h.client.pets().get(5).await.unwrap_err();

    let urls: Vec<String> = h.transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://api.test/v1/pets/5".to_string(),
            "https://api.test/autenticacao/refresh".to_string(),
            "https://api.test/v1/pets/5".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_result_is_the_retried_response() {
    let h = Harness::new(|request: &ApiRequest| {
        if request.targets(REFRESH) {
            return ok_json(json!({"access_token": "A2"}));
        }
        match request.authorization() {
            Some("Bearer A2") => ok_json(json!({"id": 5, "nome": "Rex"})),
            _ => status(StatusCode::UNAUTHORIZED),
        }
    });
    h.store_tokens(Some("A1"), Some("R1"));

    let pet = h.client.pets().get(5).await.unwrap();

    assert_eq!(pet.name, "Rex");
}

#[tokio::test]
async fn test_refresh_failure_logs_out_and_surfaces_refresh_error() {
    let h = Harness::new(token_gate("A2"));
    // Access token present but no refresh token
    h.store_tokens(Some("A1"), None);

    let err = h.client.pets().list(&ListQuery::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::NoRefreshToken));
    assert_eq!(h.transport.requests_to(PETS).len(), 1);
    assert!(h.transport.requests_to(REFRESH).is_empty());
    assert_eq!(h.session.token(), None);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.redirects.count(), 1);
}

#[tokio::test]
async fn test_rejected_refresh_is_surfaced_without_retry() {
    let h = Harness::new(|request: &ApiRequest| {
        if request.targets(REFRESH) {
            status(StatusCode::BAD_REQUEST)
        } else {
            status(StatusCode::UNAUTHORIZED)
        }
    });
    h.store_tokens(Some("A1"), Some("R1"));

    let err = h.client.pets().list(&ListQuery::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation { status: 400, .. }));
    assert_eq!(h.transport.requests_to(PETS).len(), 1);
    assert_eq!(h.redirects.count(), 1);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_second_401_is_not_retried_and_logs_out() {
    let h = Harness::new(|request: &ApiRequest| {
        if request.targets(REFRESH) {
            ok_json(json!({"access_token": "A2"}))
        } else {
            status(StatusCode::UNAUTHORIZED)
        }
    });
    h.store_tokens(Some("A1"), Some("R1"));

    let err = h.client.pets().list(&ListQuery::default()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.transport.requests_to(PETS).len(), 2);
    assert_eq!(h.transport.requests_to(REFRESH).len(), 1);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.redirects.count(), 1);
}

#[tokio::test]
async fn test_other_failure_on_retry_is_returned_as_is() {
    let h = Harness::new(|request: &ApiRequest| {
        if request.targets(REFRESH) {
            return ok_json(json!({"access_token": "A2"}));
        }
        match request.authorization() {
            Some("Bearer A2") => status(StatusCode::INTERNAL_SERVER_ERROR),
            _ => status(StatusCode::UNAUTHORIZED),
        }
    });
    h.store_tokens(Some("A1"), Some("R1"));

    let err = h.client.pets().get(1).await.unwrap_err();

    assert!(matches!(err, ApiError::ServerError { status: 500, .. }));
    // The refreshed session stays valid
    assert_eq!(h.session.token().as_deref(), Some("A2"));
    assert_eq!(h.redirects.count(), 0);
}

#[tokio::test]
async fn test_non_401_errors_propagate_without_refresh() {
    let cases: [(StatusCode, fn(&ApiError) -> bool); 4] = [
        (StatusCode::NOT_FOUND, |e: &ApiError| matches!(e, ApiError::NotFound(_))),
        (StatusCode::INTERNAL_SERVER_ERROR, |e: &ApiError| matches!(e, ApiError::ServerError { .. })),
        (StatusCode::UNPROCESSABLE_ENTITY, |e: &ApiError| matches!(e, ApiError::Validation { status: 422, .. })),
        (StatusCode::FORBIDDEN, |e: &ApiError| matches!(e, ApiError::Validation { status: 403, .. })),
    ];
    for (code, check) in cases {
        let h = Harness::new(move |_: &ApiRequest| status(code));
        h.store_tokens(Some("A1"), Some("R1"));

        let err = h.client.pets().get(1).await.unwrap_err();

        assert!(check(&err), "unexpected error for {}: {:?}", code, err);
        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(h.session.token().as_deref(), Some("A1"));
    }
}

#[tokio::test]
async fn test_401_from_refresh_endpoint_is_not_retried() {
    let h = Harness::new(|_: &ApiRequest| status(StatusCode::UNAUTHORIZED));
    h.store_tokens(Some("A1"), Some("R1"));

    let request = ApiRequest::post_json(
        "https://api.test/autenticacao/refresh",
        &json!({"refresh_token": "R1"}),
    )
    .unwrap();
    let err = h.client.execute(request).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(h.session.token().as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_interceptor_is_usable_as_a_transport() {
    use petmanager_core::http::AuthInterceptor;
    use std::sync::Arc;

    let h = Harness::new(token_gate("A2"));
    h.store_tokens(Some("A1"), Some("R1"));

    let interceptor = AuthInterceptor::new(Arc::clone(&h.session), h.transport.clone());
    let response = interceptor
        .send(ApiRequest::get("https://api.test/v1/tutores"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(h.transport.requests().len(), 3);
}

// Without coalescing, two requests rejected at the same time each run
// their own refresh. This is the default behaviour.
#[tokio::test]
async fn test_concurrent_401s_refresh_independently() {
    let h = Harness::new(token_gate("A2"));
    h.store_tokens(Some("A1"), Some("R1"));

    let pets = h.client.pets();
    let tutors = h.client.tutors();
    let query = ListQuery::default();
    let (a, b) = tokio::join!(pets.list(&query), tutors.list(&query));
    a.unwrap();
    b.unwrap();

    assert_eq!(h.transport.requests_to(REFRESH).len(), 2);
    assert_eq!(h.session.token().as_deref(), Some("A2"));
}

#[tokio::test]
async fn test_single_flight_coalesces_concurrent_refreshes() {
    let h = Harness::with_policy(RefreshPolicy::SingleFlight, token_gate("A2"));
    h.store_tokens(Some("A1"), Some("R1"));

    let pets = h.client.pets();
    let tutors = h.client.tutors();
    let query = ListQuery::default();
    let (a, b) = tokio::join!(pets.list(&query), tutors.list(&query));
    a.unwrap();
    b.unwrap();

    assert_eq!(h.transport.requests_to(REFRESH).len(), 1);
    let retried: Vec<_> = h
        .transport
        .requests()
        .into_iter()
        .filter(|r| r.authorization() == Some("Bearer A2"))
        .collect();
    assert_eq!(retried.len(), 2);
}
