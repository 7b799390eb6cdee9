//! End-to-end behaviour of the redirect handler.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use redirect_proxy::config::loader::parse_config;
use redirect_proxy::http::X_REQUEST_ID;
use redirect_proxy::{HttpServer, Table};

const CONFIG: &str = r#"
[routing]
table = """
# default: keep path and query
route add web / http://bar.com/$path opts "redirect=301"
route add legacy /strip%2fme http://new.com/$path opts "strip=/strip%2fme redirect=308"
route add docs Docs.example.com/ http://docs.com/v2$path?from=old opts "redirect=302"
route add api /api http://10.0.0.1:8080/
"""
"#;

fn server() -> HttpServer {
    let config = parse_config(CONFIG).unwrap();
    let table = Table::parse(&config.routing.table).unwrap();
    HttpServer::new(config, table)
}

async fn send(host: &str, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap();
    server().router().oneshot(request).await.unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_redirect_keeps_path_and_query() {
    let response = send("foo.com", "/a%2fb/c?x=1").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "http://bar.com/a%2fb/c?x=1");
}

#[tokio::test]
async fn test_root_request() {
    let response = send("foo.com", "/").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "http://bar.com/");
}

#[tokio::test]
async fn test_encoded_source_and_strip() {
    let response = send("foo.com", "/strip%2fme/ab%2fc").await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&response), "http://new.com/ab%2fc");
}

#[tokio::test]
async fn test_host_route_with_template_query() {
    let response = send("docs.example.com:443", "/guide?lang=en").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://docs.com/v2/guide?from=old");
}

#[tokio::test]
async fn test_proxy_target_is_bad_gateway() {
    let response = send("foo.com", "/api/users").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_no_route_is_not_found() {
    let table = Table::parse(r#"route add api /api http://api.com/ opts "redirect=301""#).unwrap();
    let server = HttpServer::new(Default::default(), table);
    let request = Request::builder().uri("/other").body(Body::empty()).unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = send("foo.com", "/abc").await;
    assert!(response.headers().contains_key(X_REQUEST_ID));

    let request = Request::builder()
        .uri("/abc")
        .header(header::HOST, "foo.com")
        .header(X_REQUEST_ID, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = server().router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
}

#[tokio::test]
async fn test_latin1_escape_is_redirected() {
    let response = send("foo.com", "/caf%E9?x=1").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "http://bar.com/caf%E9?x=1");
}

#[tokio::test]
async fn test_invalid_escape_is_bad_request() {
    let response = send("foo.com", "/a%zz").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
