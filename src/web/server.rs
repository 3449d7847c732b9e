//! HTTP server implementation for the web UI.
//!
//! `GET /` renders the listing. The mutating routes (`/add`, `/edit`,
//! `/toggle`, `/delete`) act on POST and always answer with a redirect to
//! `/`; failures are only logged.

use axum::{
    Router,
    extract::{Form, State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::templates::Templates;
use crate::db::Database;
use crate::error::{TodoError, TodoResult};
use crate::service::TodoService;
use crate::types::TodoId;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    service: TodoService<Database>,
    templates: Arc<Templates>,
}

impl AppState {
    pub fn new(service: TodoService<Database>, templates: Templates) -> Self {
        Self {
            service,
            templates: Arc::new(templates),
        }
    }

    pub fn service(&self) -> &TodoService<Database> {
        &self.service
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Form data for `/add`. Missing fields decode as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddForm {
    title: String,
    priority: String,
}

/// Form data for `/edit`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EditForm {
    id: String,
    title: String,
    priority: String,
}

/// Form data for `/toggle` and `/delete`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdForm {
    id: String,
}

fn parse_id(raw: &str) -> TodoResult<TodoId> {
    raw.trim()
        .parse()
        .map_err(|_| TodoError::InvalidId(raw.to_string()))
}

fn redirect_home() -> Redirect {
    Redirect::to("/")
}

fn log_failure(action: &'static str, err: &TodoError) {
    error!(action, code = err.code(), error = %err, "Todo operation failed");
}

fn log_rejection(action: &'static str, rejection: &FormRejection) {
    warn!(action, error = %rejection, "Malformed form submission");
}

/// Index page - renders every live todo.
async fn index(State(state): State<AppState>) -> Response {
    let todos = state.service.list().unwrap_or_else(|e| {
        log_failure("list", &e);
        Vec::new()
    });

    match state.templates.render_index(&todos) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = ?e, "Failed to render index template");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Internal Server Error</h1>".to_string()),
            )
                .into_response()
        }
    }
}

/// Non-POST requests to a mutating route do nothing.
async fn ignore_method() -> Redirect {
    redirect_home()
}

async fn add_todo(
    State(state): State<AppState>,
    form: Result<Form<AddForm>, FormRejection>,
) -> Redirect {
    match form {
        Ok(Form(form)) => {
            if let Err(e) = state.service.create(&form.title, &form.priority) {
                log_failure("add", &e);
            }
        }
        Err(rejection) => log_rejection("add", &rejection),
    }
    redirect_home()
}

async fn edit_todo(
    State(state): State<AppState>,
    form: Result<Form<EditForm>, FormRejection>,
) -> Redirect {
    match form {
        Ok(Form(form)) => {
            let result = parse_id(&form.id)
                .and_then(|id| state.service.update(id, &form.title, &form.priority));
            if let Err(e) = result {
                log_failure("edit", &e);
            }
        }
        Err(rejection) => log_rejection("edit", &rejection),
    }
    redirect_home()
}

async fn toggle_todo(
    State(state): State<AppState>,
    form: Result<Form<IdForm>, FormRejection>,
) -> Redirect {
    match form {
        Ok(Form(form)) => {
            let result = parse_id(&form.id).and_then(|id| state.service.toggle_completed(id));
            if let Err(e) = result {
                log_failure("toggle", &e);
            }
        }
        Err(rejection) => log_rejection("toggle", &rejection),
    }
    redirect_home()
}

async fn delete_todo(
    State(state): State<AppState>,
    form: Result<Form<IdForm>, FormRejection>,
) -> Redirect {
    match form {
        Ok(Form(form)) => {
            let result = parse_id(&form.id).and_then(|id| state.service.delete(id));
            if let Err(e) = result {
                log_failure("delete", &e);
            }
        }
        Err(rejection) => log_rejection("delete", &rejection),
    }
    redirect_home()
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add_todo).fallback(ignore_method))
        .route("/edit", post(edit_todo).fallback(ignore_method))
        .route("/toggle", post(toggle_todo).fallback(ignore_method))
        .route("/delete", post(delete_todo).fallback(ignore_method))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
///
/// Returns the bound address and the task driving the server.
pub async fn start_server<F>(
    state: AppState,
    static_dir: &Path,
    addr: &str,
    shutdown: F,
) -> anyhow::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Web UI listening on http://{}", bound_addr);

    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Web UI shutting down");
            })
            .await
    });

    Ok((bound_addr, task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TodoStore;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let db = Database::open_in_memory().unwrap();
        AppState::new(
            TodoService::new(Arc::new(db)),
            Templates::embedded().unwrap(),
        )
    }

    fn app(state: &AppState) -> Router {
        build_router(state.clone(), Path::new("static"))
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn assert_redirects_home(response: &Response) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn add_creates_todo_and_redirects() {
        let state = test_state();

        let response = app(&state)
            .oneshot(post_form("/add", "title=Buy+milk&priority=High"))
            .await
            .unwrap();

        assert_redirects_home(&response);
        let todos = state.service().list().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Buy milk");
        assert_eq!(todos[0].priority, "High");
        assert!(!todos[0].completed);
    }

    #[tokio::test]
    async fn duplicate_add_still_redirects() {
        let state = test_state();
        state.service().create("Buy milk", "High").unwrap();

        let response = app(&state)
            .oneshot(post_form("/add", "title=Buy+milk&priority=Low"))
            .await
            .unwrap();

        assert_redirects_home(&response);
        assert_eq!(state.service().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_on_mutating_route_is_a_no_op_redirect() {
        let state = test_state();

        let request = Request::builder()
            .uri("/add?title=x&priority=y")
            .body(Body::empty())
            .unwrap();
        let response = app(&state).oneshot(request).await.unwrap();

        assert_redirects_home(&response);
        assert!(state.service().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_edit_and_delete_by_form_id() {
        let state = test_state();
        let id = state.service().create("Buy milk", "High").unwrap();

        let response = app(&state)
            .oneshot(post_form("/toggle", &format!("id={}", id)))
            .await
            .unwrap();
        assert_redirects_home(&response);
        assert!(state.service().store().find_by_id(id).unwrap().completed);

        let response = app(&state)
            .oneshot(post_form(
                "/edit",
                &format!("id={}&title=Buy+oat+milk&priority=Low", id),
            ))
            .await
            .unwrap();
        assert_redirects_home(&response);
        let todo = state.service().store().find_by_id(id).unwrap();
        assert_eq!(todo.title, "Buy oat milk");
        assert_eq!(todo.priority, "Low");
        assert!(todo.completed);

        let response = app(&state)
            .oneshot(post_form("/delete", &format!("id={}", id)))
            .await
            .unwrap();
        assert_redirects_home(&response);
        assert!(state.service().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_ids_and_malformed_bodies_redirect() {
        let state = test_state();

        for (uri, body) in [
            ("/toggle", "id=abc"),
            ("/delete", ""),
            ("/edit", "id=999&title=x&priority=y"),
        ] {
            let response = app(&state).oneshot(post_form(uri, body)).await.unwrap();
            assert_redirects_home(&response);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"x"}"#))
            .unwrap();
        let response = app(&state).oneshot(request).await.unwrap();
        assert_redirects_home(&response);
        assert!(state.service().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn index_lists_todos() {
        let state = test_state();
        state.service().create("Buy milk", "High").unwrap();
        state.service().create("Walk <dog>", "Low").unwrap();

        let response = app(&state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Buy milk"));
        assert!(html.contains("Walk &lt;dog&gt;"));
    }

    #[tokio::test]
    async fn health_reports_version() {
        let state = test_state();

        let response = app(&state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn static_files_are_served_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body { margin: 0; }").unwrap();
        let router = build_router(test_state(), dir.path());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/static/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/css"), "got {content_type}");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"body { margin: 0; }");

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/static/missing.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn start_server_binds_and_shuts_down() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let (addr, task) = start_server(test_state(), Path::new("static"), "127.0.0.1:0", async move {
            let _ = rx.await;
        })
        .await
        .unwrap();

        assert_ne!(addr.port(), 0);
        tx.send(()).unwrap();
        task.await.unwrap().unwrap();
    }
}
