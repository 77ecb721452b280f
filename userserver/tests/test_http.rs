use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use std::sync::Arc;
use tower::ServiceExt;
use userserver::http::soap_router;
use usersoap::{Dispatcher, OperationRegistry};
use userstore::{Repository, User, UserStore};

fn create_test_router() -> axum::Router {
    let store = UserStore::open_in_memory().unwrap();
    let mut alice = User::new("Alice Johnson", "alice@example.com");
    store.save(&mut alice).unwrap();

    let dispatcher = Dispatcher::new(
        Arc::new(OperationRegistry::with_user_operations()),
        Arc::new(store),
    );
    soap_router("/soap/user", Arc::new(dispatcher))
}

async fn post(router: axum::Router, body: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/soap/user")
                .header(header::CONTENT_TYPE, "text/xml")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_get_is_rejected() {
    let response = create_test_router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/soap/user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_other_paths_are_not_found() {
    let response = create_test_router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/soap/other")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_success_headers() {
    let (status, headers, body) = post(
        create_test_router(),
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><GetUserByID xmlns="urn:user-service"><id>1</id></GetUserByID></soap:Body></soap:Envelope>"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/xml; charset=utf-8");
    assert_eq!(headers["soapaction"], "");
    assert!(body.contains("<GetUserByIDResponse xmlns=\"urn:user-service\">"));
    assert!(body.contains("<ID>1</ID>"));
    assert!(body.contains("<Name>Alice Johnson</Name>"));
    assert!(!body.contains("<name>"));
}

#[tokio::test]
async fn test_fault_is_transport_success() {
    let (status, headers, body) = post(create_test_router(), "garbage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/xml; charset=utf-8");
    assert!(body.contains("<faultcode>Client</faultcode>"));
    assert!(body.contains("<faultstring>Invalid SOAP message</faultstring>"));
}

#[tokio::test]
async fn test_unreadable_body_is_client_fault() {
    // Au-delà de la limite par défaut d'axum (2 Mio)
    let oversized = vec![b' '; 2 * 1024 * 1024 + 1];

    let response = create_test_router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/soap/user")
                .header(header::CONTENT_TYPE, "text/xml")
                .body(Body::from(oversized))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/xml; charset=utf-8"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("<faultcode>Client</faultcode>"));
    assert!(body.contains("<faultstring>Failed to read request body</faultstring>"));
}
