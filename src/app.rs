//! The HTTP application: shared state, parameter extraction, and the
//! traversal dispatcher every request goes through.

use std::sync::Arc;

use axum::Router;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::any;
use axum::Form;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tera::Tera;
use tokio::sync::Mutex;

use crate::DataStoreError;
use crate::resources::{Collection, Films, People, Row, Table};
use crate::schema::Params;
use crate::session::Session;
use crate::traversal::{Located, Node, ResourceTree, TableKind};
use crate::views::{self, View};

/////////////////////////////////////////////// State ////////////////////////////////////////////////

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool for the catalog database.
    pub pool: SqlitePool,
    /// The tree request paths are resolved against.
    pub tree: Arc<ResourceTree>,
    /// Templates for the HTML views.
    pub templates: Arc<Tera>,
    /// Held for the whole unit of work of every writing request, so at most
    /// one transaction writes to the database at a time.
    pub writer: Arc<Mutex<()>>,
}

impl AppState {
    /// State serving the default catalog tree from `pool`.
    pub fn new(pool: SqlitePool) -> Result<Self, tera::Error> {
        Ok(Self {
            pool,
            tree: Arc::new(ResourceTree::catalog()),
            templates: Arc::new(views::templates()?),
            writer: Arc::new(Mutex::new(())),
        })
    }
}

/// Builds the router: every path is resolved by traversal.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(traverse))
        .route("/*path", any(traverse))
        .with_state(state)
}

////////////////////////////////////////////// Params //////////////////////////////////////////////

/// Request parameters, read from the query string for `GET` and `DELETE` and
/// from a JSON or form body for `POST` and `PUT`.
pub struct RequestParams(pub Params);

/// A request whose parameters could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsRejection(pub String);

impl IntoResponse for ParamsRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({"body": self.0}))).into_response()
    }
}

/// Folds `key=value` pairs into a map; repeated keys become lists.
pub fn collect_pairs(pairs: Vec<(String, String)>) -> Params {
    let mut params = Params::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match params.get_mut(&key) {
            None => {
                params.insert(key, value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    params
}

#[async_trait]
impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = ParamsRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !matches!(*req.method(), Method::POST | Method::PUT) {
            let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
                .map_err(|e| ParamsRejection(e.body_text()))?;
            return Ok(RequestParams(collect_pairs(pairs)));
        }

        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ParamsRejection(e.body_text()))?;
            return Ok(RequestParams(collect_pairs(pairs)));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ParamsRejection(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(RequestParams(Params::new()));
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(params)) => Ok(RequestParams(params)),
            Ok(_) => Err(ParamsRejection("expected a JSON object".to_string())),
            Err(e) => Err(ParamsRejection(format!("invalid json: {}", e))),
        }
    }
}

///////////////////////////////////////////// Dispatch /////////////////////////////////////////////

fn allowed(located: &Located, method: &Method) -> bool {
    match located {
        Located::Index(_) => *method == Method::GET,
        Located::Collection(..) => matches!(*method, Method::GET | Method::POST),
        Located::Row(..) => matches!(*method, Method::GET | Method::PUT | Method::DELETE),
    }
}

async fn collection<T: Table>(
    node: Arc<Node>,
    method: &Method,
    params: &Params,
    session: &mut Session,
) -> Result<View, DataStoreError> {
    let mut collection = Collection::<T>::new(node, session);
    match *method {
        Method::POST => views::create(&mut collection, params).await,
        Method::GET => views::list(&mut collection, params).await,
        _ => Ok(View::method_not_allowed()),
    }
}

async fn row<T: Table>(
    node: Arc<Node>,
    id: i64,
    method: &Method,
    params: &Params,
    session: &mut Session,
) -> Result<View, DataStoreError> {
    let mut row = Row::<T>::new(node, id, session);
    match *method {
        Method::GET => views::retrieve(&mut row, params).await,
        Method::PUT => views::update(&mut row, params).await,
        Method::DELETE => views::delete(&mut row, params).await,
        _ => Ok(View::method_not_allowed()),
    }
}

async fn dispatch(
    state: &AppState,
    located: Located,
    method: &Method,
    params: &Params,
    session: &mut Session,
) -> Result<View, DataStoreError> {
    match located {
        Located::Index(_) => {
            let node = state
                .tree
                .collection(TableKind::Films)
                .cloned()
                .ok_or_else(|| DataStoreError::Internal("no films collection".to_string()))?;
            let mut films = Collection::<Films>::new(node, session);
            views::home(&mut films, params, &state.templates).await
        }
        Located::Collection(TableKind::People, node) => {
            collection::<People>(node, method, params, session).await
        }
        Located::Collection(TableKind::Films, node) => {
            collection::<Films>(node, method, params, session).await
        }
        Located::Row(TableKind::People, node, id) => {
            row::<People>(node, id, method, params, session).await
        }
        Located::Row(TableKind::Films, node, id) => {
            row::<Films>(node, id, method, params, session).await
        }
    }
}

/// Resolves the path, runs the matching view inside one unit of work, and
/// commits it unless the view failed.
async fn traverse(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    params: Result<RequestParams, ParamsRejection>,
) -> Response {
    let path = uri.path().to_string();
    let located = match state.tree.resolve_path(&path) {
        Ok(located) => located,
        Err(err) => {
            tracing::debug!(error = %err, path = %path, "path did not resolve");
            tracing::info!(method = %method, path = %path, status = 404, "request");
            return StatusCode::NOT_FOUND.into_response();
        }
    };
    tracing::debug!(node = %located.node().path(), "resolved");

    if !allowed(&located, &method) {
        tracing::info!(method = %method, path = %path, status = 405, "request");
        return View::method_not_allowed().into_response();
    }
    let params = match params {
        Ok(RequestParams(params)) => params,
        Err(rejection) => {
            tracing::info!(method = %method, path = %path, status = 400, "request");
            return rejection.into_response();
        }
    };

    let _writer = if method == Method::GET {
        None
    } else {
        Some(state.writer.lock().await)
    };
    let view = match Session::begin(&state.pool).await {
        Ok(mut session) => {
            match dispatch(&state, located, &method, &params, &mut session).await {
                Ok(view) => match session.commit().await {
                    Ok(()) => view,
                    Err(err) => View::internal(&err),
                },
                Err(err) => {
                    tracing::error!(error = %err, method = %method, path = %path, "request failed");
                    if let Err(rollback) = session.rollback().await {
                        tracing::error!(error = %rollback, "rollback failed");
                    }
                    View::internal(&err)
                }
            }
        }
        Err(err) => View::internal(&err),
    };
    tracing::info!(method = %method, path = %path, status = view.status().as_u16(), "request");
    view.into_response()
}
