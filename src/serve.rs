//! Purpose: Provide the HTTP/JSON server for the bookshelf API.
//! Exports: `ServeConfig`, `serve`, `validate_config`, `router`.
//! Role: Axum-based server exposing add/list/get/update/delete over `/books`.
//! Invariants: Every response body is a `{status, message?, data?}` envelope.
//! Invariants: Each handler holds the store lock for exactly one store operation.
//! Invariants: Loopback-only unless explicitly allowed.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path as AxumPath, Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookshelf::api::{
    Book, BookInput, BookStore, BookSummary, Error, ErrorKind, ListFilter, Violation,
};

pub const DEFAULT_BIND: &str = "127.0.0.1:9000";
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub allow_non_loopback: bool,
    pub max_body_bytes: u64,
}

struct AppState {
    store: Mutex<BookStore>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Operation {
    Add,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    fn success_message(self) -> Option<&'static str> {
        match self {
            Operation::Add => Some("Book added successfully"),
            Operation::Update => Some("Book updated successfully"),
            Operation::Delete => Some("Book deleted successfully"),
            Operation::List | Operation::Get => None,
        }
    }

    fn fail_message(self, err: &Error) -> &'static str {
        use Violation::{MalformedPayload, MissingName, ReadPageExceedsPageCount};

        match (self, err.kind(), err.violation()) {
            (Operation::Add, ErrorKind::Validation, Some(MissingName)) => {
                "Failed to add book. Please provide the book name"
            }
            (Operation::Add, ErrorKind::Validation, Some(ReadPageExceedsPageCount)) => {
                "Failed to add book. readPage cannot be greater than pageCount"
            }
            (Operation::Add, ErrorKind::Validation, _) => {
                "Failed to add book. Invalid request payload"
            }
            (Operation::Add, _, _) => "Failed to add book",
            (Operation::Update, ErrorKind::Validation, Some(MissingName)) => {
                "Failed to update book. Please provide the book name"
            }
            (Operation::Update, ErrorKind::Validation, Some(ReadPageExceedsPageCount)) => {
                "Failed to update book. readPage cannot be greater than pageCount"
            }
            (Operation::Update, ErrorKind::Validation, Some(MalformedPayload) | None) => {
                "Failed to update book. Invalid request payload"
            }
            (Operation::Update, ErrorKind::NotFound, _) => "Failed to update book. Id not found",
            (Operation::Update, _, _) => "Failed to update book",
            (Operation::Delete, ErrorKind::NotFound, _) => "Failed to delete book. Id not found",
            (Operation::Delete, _, _) => "Failed to delete book",
            (Operation::Get, ErrorKind::NotFound, _) => "Book not found",
            (Operation::Get, _, _) => "Failed to fetch book",
            (Operation::List, ErrorKind::Validation | ErrorKind::Usage, _) => {
                "Failed to list books. Invalid query parameters"
            }
            (Operation::List, _, _) => "Failed to list books",
        }
    }
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let app = router(BookStore::new(), &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!(bind = %config.bind, "bookshelf listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

pub fn router(store: BookStore, config: &ServeConfig) -> Result<Router, Error> {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });
    router_with_state(state, config)
}

fn router_with_state(state: Arc<AppState>, config: &ServeConfig) -> Result<Router, Error> {
    let max_body_bytes: usize = config
        .max_body_bytes
        .try_into()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("--max-body-bytes is too large"))?;

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/books", get(list_books).post(add_book))
        .route(
            "/books/:book_id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes));
    if let Some(cors) = cors_layer(&config.cors_allowed_origins)? {
        app = app.layer(cors);
    }
    Ok(app.layer(TraceLayer::new_for_http()).with_state(state))
}

pub fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !config.bind.ip().is_loopback() && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 1048576."));
    }

    if config.max_body_bytes > usize::MAX as u64 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory."));
    }

    cors_layer(&config.cors_allowed_origins)?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>, Error> {
    if origins.is_empty() {
        return Ok(None);
    }
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            let value = HeaderValue::from_str(origin.trim())
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    Error::new(ErrorKind::Usage)
                        .with_message(format!("invalid --cors-origin value: {origin:?}"))
                        .with_hint("Use an origin like http://localhost:3000, or * for any.")
                })?;
            values.push(value);
        }
        AllowOrigin::list(values)
    };
    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    ))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, BookStore>, Error> {
    state
        .store
        .lock()
        .map_err(|_| Error::new(ErrorKind::Internal).with_message("book store lock poisoned"))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    name: Option<String>,
    reading: Option<String>,
    finished: Option<String>,
}

async fn healthz() -> Response {
    (StatusCode::OK, Json(json!({ "ok": true }))).into_response()
}

async fn route_not_found() -> Response {
    envelope_response(
        StatusCode::NOT_FOUND,
        json!({ "status": "fail", "message": "Route not found" }),
    )
}

async fn add_book(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return fail_response(Operation::Add, malformed_payload(rejection)),
    };
    let result = lock_store(&state).and_then(|mut store| store.add(input));
    match result {
        Ok(book_id) => {
            tracing::info!(book_id = %book_id, "book added");
            success_response(
                Operation::Add,
                StatusCode::CREATED,
                Some(json!({ "bookId": book_id })),
            )
        }
        Err(err) => fail_response(Operation::Add, err),
    }
}

async fn list_books(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            let err = Error::new(ErrorKind::Usage).with_message(rejection.body_text());
            return fail_response(Operation::List, err);
        }
    };
    let filter = ListFilter::from_query(
        query.name.as_deref(),
        query.reading.as_deref(),
        query.finished.as_deref(),
    );
    match lock_store(&state).map(|store| store.list(&filter)) {
        Ok(books) => {
            let books: Vec<Value> = books.iter().map(summary_json).collect();
            success_response(
                Operation::List,
                StatusCode::OK,
                Some(json!({ "books": books })),
            )
        }
        Err(err) => fail_response(Operation::List, err),
    }
}

async fn get_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
) -> Response {
    let result = lock_store(&state)
        .and_then(|store| store.get(&book_id).cloned())
        .and_then(|book| book_json(&book));
    match result {
        Ok(book) => success_response(Operation::Get, StatusCode::OK, Some(json!({ "book": book }))),
        Err(err) => fail_response(Operation::Get, err),
    }
}

async fn update_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return fail_response(Operation::Update, malformed_payload(rejection)),
    };
    let result = lock_store(&state).and_then(|mut store| store.update(&book_id, input));
    match result {
        Ok(()) => {
            tracing::info!(book_id = %book_id, "book updated");
            success_response(Operation::Update, StatusCode::OK, None)
        }
        Err(err) => fail_response(Operation::Update, err),
    }
}

async fn delete_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
) -> Response {
    let result = lock_store(&state).and_then(|mut store| store.delete(&book_id));
    match result {
        Ok(()) => {
            tracing::info!(book_id = %book_id, "book deleted");
            success_response(Operation::Delete, StatusCode::OK, None)
        }
        Err(err) => fail_response(Operation::Delete, err),
    }
}

fn malformed_payload(rejection: JsonRejection) -> Error {
    Error::validation(Violation::MalformedPayload).with_message(rejection.body_text())
}

fn summary_json(book: &BookSummary) -> Value {
    json!({
        "id": book.id,
        "name": book.name,
        "publisher": book.publisher,
    })
}

fn book_json(book: &Book) -> Result<Value, Error> {
    Ok(json!({
        "id": book.id,
        "name": book.name,
        "year": book.year,
        "author": book.author,
        "summary": book.summary,
        "publisher": book.publisher,
        "pageCount": book.page_count,
        "readPage": book.read_page,
        "finished": book.finished,
        "reading": book.reading,
        "insertedAt": timestamp(book.inserted_at)?,
        "updatedAt": timestamp(book.updated_at)?,
    }))
}

fn timestamp(value: OffsetDateTime) -> Result<String, Error> {
    value.format(&Rfc3339).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to format timestamp")
            .with_source(err)
    })
}

fn success_response(operation: Operation, status: StatusCode, data: Option<Value>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("status".to_string(), json!("success"));
    if let Some(message) = operation.success_message() {
        body.insert("message".to_string(), json!(message));
    }
    if let Some(data) = data {
        body.insert("data".to_string(), data);
    }
    envelope_response(status, Value::Object(body))
}

fn fail_response(operation: Operation, err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Validation | ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(operation = ?operation, error = %err, "request failed");
    } else {
        tracing::debug!(operation = ?operation, error = %err, "request rejected");
    }
    envelope_response(
        status,
        json!({ "status": "fail", "message": operation.fail_message(&err) }),
    )
}

fn envelope_response(status: StatusCode, payload: Value) -> Response {
    (status, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::{
        AppState, DEFAULT_MAX_BODY_BYTES, Operation, ServeConfig, router, router_with_state,
        serve, validate_config,
    };
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use bookshelf::api::{BookStore, Error, ErrorKind, ID_LEN, Violation};
    use serde_json::{Value, json};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use tower_service::Service;

    fn config(bind: &str) -> ServeConfig {
        ServeConfig {
            bind: bind.parse().expect("bind"),
            cors_allowed_origins: Vec::new(),
            allow_non_loopback: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    fn app() -> Router {
        router(BookStore::new(), &config("127.0.0.1:0")).expect("router")
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut app = app.clone();
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(Body::from(body.unwrap_or_default().to_string()))
            .expect("request");
        std::future::poll_fn(|cx| Service::<Request<Body>>::poll_ready(&mut app, cx))
            .await
            .expect("ready");
        let response = Service::<Request<Body>>::call(&mut app, request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    fn book_payload(name: &str, page_count: u32, read_page: u32, reading: bool) -> String {
        json!({
            "name": name,
            "year": 2020,
            "author": "A",
            "summary": "S",
            "publisher": "P",
            "pageCount": page_count,
            "readPage": read_page,
            "reading": reading,
        })
        .to_string()
    }

    async fn add(
        app: &Router,
        name: &str,
        page_count: u32,
        read_page: u32,
        reading: bool,
    ) -> String {
        let payload = book_payload(name, page_count, read_page, reading);
        let (status, body) = send(app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["bookId"].as_str().expect("book id").to_string()
    }

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let err = serve(config("0.0.0.0:0"))
            .await
            .expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn non_loopback_requires_allow_flag() {
        let mut config = config("0.0.0.0:0");
        let err = validate_config(&config).expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);

        config.allow_non_loopback = true;
        validate_config(&config).expect("config ok");
    }

    #[test]
    fn body_limit_must_be_positive() {
        let mut config = config("127.0.0.1:0");
        config.max_body_bytes = 0;
        let err = validate_config(&config).expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn cors_origins_must_be_header_values() {
        let mut config = config("127.0.0.1:0");
        config.cors_allowed_origins = vec!["http://localhost:3000".to_string()];
        validate_config(&config).expect("config ok");

        config.cors_allowed_origins = vec!["bad\norigin".to_string()];
        let err = validate_config(&config).expect_err("expected usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn fail_messages_follow_error_precedence() {
        let missing_name = Error::validation(Violation::MissingName);
        let pages = Error::validation(Violation::ReadPageExceedsPageCount);
        let not_found = Error::new(ErrorKind::NotFound);

        assert_eq!(
            Operation::Add.fail_message(&missing_name),
            "Failed to add book. Please provide the book name"
        );
        assert_eq!(
            Operation::Update.fail_message(&pages),
            "Failed to update book. readPage cannot be greater than pageCount"
        );
        assert_eq!(
            Operation::Update.fail_message(&not_found),
            "Failed to update book. Id not found"
        );
        assert_eq!(Operation::Get.fail_message(&not_found), "Book not found");
        assert_eq!(
            Operation::Add.fail_message(&Error::new(ErrorKind::Internal)),
            "Failed to add book"
        );
    }

    #[tokio::test]
    async fn add_returns_created_envelope() {
        let app = app();
        let payload = book_payload("Dicoding", 100, 100, false);
        let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Book added successfully");
        let book_id = body["data"]["bookId"].as_str().expect("book id");
        assert_eq!(book_id.len(), ID_LEN);

        let uri = format!("/books/{book_id}");
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let book = &body["data"]["book"];
        assert_eq!(book["id"], book_id);
        assert_eq!(book["finished"], true);
        assert_eq!(book["pageCount"], 100);
        assert_eq!(book["insertedAt"], book["updatedAt"]);
    }

    #[tokio::test]
    async fn add_rejections_are_bad_requests() {
        let app = app();

        let payload = book_payload("Dicoding", 100, 150, false);
        let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Failed to add book. readPage cannot be greater than pageCount"
        );

        let payload = book_payload("", 100, 10, false);
        let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Failed to add book. Please provide the book name");

        let (status, body) = send(&app, Method::POST, "/books", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Failed to add book. Invalid request payload");

        let (_, body) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(body["data"]["books"], json!([]));
    }

    #[tokio::test]
    async fn list_applies_last_filter_only() {
        let app = app();
        let first = add(&app, "Rust in Action", 10, 10, false).await;
        let second = add(&app, "Programming Rust", 10, 2, true).await;
        let third = add(&app, "Go Programming", 10, 10, true).await;

        let (status, body) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body.get("message").is_none());
        let books = body["data"]["books"].as_array().expect("books");
        assert_eq!(books.len(), 3);
        assert_eq!(books[0], json!({ "id": first, "name": "Rust in Action", "publisher": "P" }));

        let ids = |body: &Value| -> Vec<String> {
            body["data"]["books"]
                .as_array()
                .expect("books")
                .iter()
                .map(|book| book["id"].as_str().expect("id").to_string())
                .collect()
        };

        let (_, body) = send(&app, Method::GET, "/books?name=RUST", None).await;
        assert_eq!(ids(&body), vec![first.clone(), second.clone()]);

        let (_, body) = send(&app, Method::GET, "/books?reading=1", None).await;
        assert_eq!(ids(&body), vec![second.clone(), third.clone()]);

        let (_, body) = send(&app, Method::GET, "/books?finished=0", None).await;
        assert_eq!(ids(&body), vec![second.clone()]);

        let uri = "/books?name=rust&reading=1&finished=1";
        let (_, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(ids(&body), vec![first.clone(), third]);

        // Blank flags compare equal to 0.
        let (status, body) = send(&app, Method::GET, "/books?reading=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![first]);

        let (_, body) = send(&app, Method::GET, "/books?finished=%20", None).await;
        assert_eq!(ids(&body), vec![second]);

        let (_, body) = send(&app, Method::GET, "/books?reading=yes", None).await;
        assert_eq!(ids(&body).len(), 3);
    }

    #[tokio::test]
    async fn update_and_delete_lifecycle() {
        let app = app();
        let book_id = add(&app, "Draft", 100, 100, false).await;
        let uri = format!("/books/{book_id}");
        let (_, before) = send(&app, Method::GET, &uri, None).await;

        let payload = book_payload("Final", 200, 50, true);
        let (status, body) = send(&app, Method::PUT, &uri, Some(&payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success", "message": "Book updated successfully" }));

        let (_, after) = send(&app, Method::GET, &uri, None).await;
        let book = &after["data"]["book"];
        assert_eq!(book["name"], "Final");
        assert_eq!(book["pageCount"], 200);
        assert_eq!(book["readPage"], 50);
        assert_eq!(book["reading"], true);
        assert_eq!(book["finished"], true);
        assert_eq!(book["insertedAt"], before["data"]["book"]["insertedAt"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book deleted successfully");

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "status": "fail", "message": "Book not found" }));

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Failed to delete book. Id not found");
    }

    #[tokio::test]
    async fn update_status_codes() {
        let app = app();
        let book_id = add(&app, "Kept", 10, 5, false).await;

        let payload = book_payload("Kept", 10, 5, false);
        let (status, body) = send(&app, Method::PUT, "/books/unknown", Some(&payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Failed to update book. Id not found");

        let payload = json!({ "pageCount": 10, "readPage": 5 }).to_string();
        let (status, body) = send(&app, Method::PUT, "/books/unknown", Some(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Failed to update book. Please provide the book name");

        let payload = json!({ "pageCount": 10, "readPage": 50 }).to_string();
        let uri = format!("/books/{book_id}");
        let (status, body) = send(&app, Method::PUT, &uri, Some(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Failed to update book. readPage cannot be greater than pageCount"
        );

        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(body["data"]["book"]["readPage"], 5);
    }

    #[tokio::test]
    async fn oversize_body_is_an_invalid_payload() {
        let mut config = config("127.0.0.1:0");
        config.max_body_bytes = 16;
        let app = router(BookStore::new(), &config).expect("router");

        let payload = book_payload("A name that does not fit", 10, 1, false);
        let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "status": "fail", "message": "Failed to add book. Invalid request payload" })
        );

        let (_, body) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(body["data"]["books"], json!([]));
    }

    #[tokio::test]
    async fn poisoned_store_is_an_internal_error() {
        let state = Arc::new(AppState {
            store: Mutex::new(BookStore::new()),
        });
        let app = router_with_state(Arc::clone(&state), &config("127.0.0.1:0")).expect("router");

        let poisoner = Arc::clone(&state);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.store.lock().expect("lock");
            panic!("panic while holding the store lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(state.store.is_poisoned());

        let payload = book_payload("Dicoding", 100, 10, false);
        let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "status": "fail", "message": "Failed to add book" }));

        let (status, body) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "status": "fail", "message": "Failed to list books" }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_get_distinct_ids() {
        const ADDS: usize = 32;
        let app = app();

        let mut tasks = Vec::with_capacity(ADDS);
        for index in 0..ADDS {
            let app = app.clone();
            tasks.push(tokio::spawn(async move {
                let payload = book_payload(&format!("Book {index}"), 10, 1, false);
                let (status, body) = send(&app, Method::POST, "/books", Some(&payload)).await;
                assert_eq!(status, StatusCode::CREATED);
                body["data"]["bookId"].as_str().expect("book id").to_string()
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            let book_id = task.await.expect("task");
            assert_eq!(book_id.len(), ID_LEN);
            ids.insert(book_id);
        }
        assert_eq!(ids.len(), ADDS);

        let (_, body) = send(&app, Method::GET, "/books", None).await;
        let books = body["data"]["books"].as_array().expect("books");
        assert_eq!(books.len(), ADDS);
        for book in books {
            assert!(ids.contains(book["id"].as_str().expect("id")));
        }
    }

    #[tokio::test]
    async fn unknown_routes_use_the_envelope() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/shelves", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");

        let (status, body) = send(&app, Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }
}
