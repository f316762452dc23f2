//! Per-verb handlers that turn parameters into a response.
//!
//! Each view validates its parameters through the table's schemas, calls the
//! collection or row handle, and shapes the status code and body.  Storage
//! failures other than conflicts and bad references propagate as
//! [`DataStoreError`] so the dispatcher can roll back.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};
use tera::Tera;

use crate::DataStoreError;
use crate::film::Film;
use crate::projection::Record;
use crate::resources::{Collection, Films, Row, Table};
use crate::schema::{FieldErrors, FilmFilterSchema, IdSchema, Params, Schema};

//////////////////////////////////////////////// View ////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Json(Value),
    Html(String),
}

/// A rendered response: status, optional `Location`, and a JSON or HTML body.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    status: StatusCode,
    location: Option<String>,
    body: Body,
}

impl View {
    /// A JSON response.
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            location: None,
            body: Body::Json(body),
        }
    }

    /// An HTML response.
    pub fn html(status: StatusCode, body: String) -> Self {
        Self {
            status,
            location: None,
            body: Body::Html(body),
        }
    }

    /// 400 with the failed fields as the body.
    pub fn invalid(errors: FieldErrors) -> Self {
        Self::json(StatusCode::BAD_REQUEST, json!(errors))
    }

    /// 405 with an empty object.
    pub fn method_not_allowed() -> Self {
        Self::json(StatusCode::METHOD_NOT_ALLOWED, json!({}))
    }

    /// 500 carrying the storage error message.
    pub fn internal(err: &DataStoreError) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": err.to_string()}),
        )
    }

    fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The `Location` header, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The JSON body, if this is a JSON response.
    pub fn body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Html(_) => None,
        }
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Body::Json(value) => (self.status, Json(value)).into_response(),
            Body::Html(html) => (self.status, Html(html)).into_response(),
        };
        if let Some(location) = self.location {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    response.headers_mut().insert(header::LOCATION, value);
                }
                Err(_) => tracing::error!(location = %location, "unrepresentable location header"),
            }
        }
        response
    }
}

////////////////////////////////////////////// Helpers /////////////////////////////////////////////

fn both<A, B>(
    a: Result<A, FieldErrors>,
    b: Result<B, FieldErrors>,
) -> Result<(A, B), FieldErrors> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(mut errors), Err(more)) => {
            errors.merge(more);
            Err(errors)
        }
        (Err(errors), Ok(_)) | (Ok(_), Err(errors)) => Err(errors),
    }
}

fn row_id<T: Table>(row: &Row<'_, T>) -> Result<i64, FieldErrors> {
    let mut params = Params::new();
    params.insert(
        "id".to_string(),
        Value::String(row.node().name().to_string()),
    );
    IdSchema::deserialize(&params)
}

/// Converts a bad credit reference into a 400; anything else propagates.
fn rejected(err: DataStoreError) -> Result<View, DataStoreError> {
    match err {
        DataStoreError::InvalidReference { field, id } => {
            let mut errors = FieldErrors::new();
            errors.insert(field, format!("{} does not exist", id));
            Ok(View::invalid(errors))
        }
        err => Err(err),
    }
}

///////////////////////////////////////////// Collection /////////////////////////////////////////////

/// `POST` on a collection: create a row.
pub async fn create<T: Table>(
    collection: &mut Collection<'_, T>,
    params: &Params,
) -> Result<View, DataStoreError> {
    let data = match T::CreateSchema::deserialize(params) {
        Ok(data) => data,
        Err(errors) => return Ok(View::invalid(errors)),
    };
    match collection.create(&data).await {
        Ok(Some(record)) => {
            let location = format!("{}{}/", collection.node().path(), record.id());
            Ok(View::json(StatusCode::CREATED, json!({"id": record.id()})).with_location(location))
        }
        Ok(None) => Ok(View::json(StatusCode::BAD_REQUEST, json!({}))),
        Err(err) => rejected(err),
    }
}

/// `GET` on a collection: list matching rows.
pub async fn list<T: Table>(
    collection: &mut Collection<'_, T>,
    params: &Params,
) -> Result<View, DataStoreError> {
    let (filter, fields) = match both(
        T::FilterSchema::deserialize(params),
        T::FieldsSchema::deserialize(params),
    ) {
        Ok(parsed) => parsed,
        Err(errors) => return Ok(View::invalid(errors)),
    };
    let records = collection.retrieve(&filter).await?;
    if records.is_empty() {
        return Ok(View::json(StatusCode::NOT_FOUND, json!([])));
    }
    let body: Vec<Value> = records
        .iter()
        .map(|record| Value::Object(record.serialize_fields(&fields)))
        .collect();
    Ok(View::json(StatusCode::OK, Value::Array(body)))
}

//////////////////////////////////////////////// Row ///////////////////////////////////////////////

/// `GET` on a row: read it.
pub async fn retrieve<T: Table>(
    row: &mut Row<'_, T>,
    params: &Params,
) -> Result<View, DataStoreError> {
    let fields = match both(row_id(row), T::FieldsSchema::deserialize(params)) {
        Ok((_, fields)) => fields,
        Err(errors) => return Ok(View::invalid(errors)),
    };
    match row.retrieve().await? {
        Some(record) => Ok(View::json(
            StatusCode::OK,
            Value::Object(record.serialize_fields(&fields)),
        )),
        None => Ok(View::json(StatusCode::NOT_FOUND, json!({}))),
    }
}

/// `PUT` on a row: change it.
pub async fn update<T: Table>(
    row: &mut Row<'_, T>,
    params: &Params,
) -> Result<View, DataStoreError> {
    let changes = match both(row_id(row), T::UpdateSchema::deserialize(params)) {
        Ok((_, changes)) => changes,
        Err(errors) => return Ok(View::invalid(errors)),
    };
    match row.update(&changes).await {
        Ok(Some(record)) => Ok(View::json(StatusCode::OK, Value::Object(record.serialize()))),
        Ok(None) => Ok(View::json(StatusCode::BAD_REQUEST, json!({}))),
        Err(err) => rejected(err),
    }
}

/// `DELETE` on a row: remove it.
pub async fn delete<T: Table>(
    row: &mut Row<'_, T>,
    _params: &Params,
) -> Result<View, DataStoreError> {
    if let Err(errors) = row_id(row) {
        return Ok(View::invalid(errors));
    }
    row.delete().await?;
    Ok(View::json(StatusCode::OK, json!({})))
}

/////////////////////////////////////////////// Index //////////////////////////////////////////////

/// Name of the homepage template.
pub const HOME_TEMPLATE: &str = "index.html.tera";

/// Loads the templates the HTML views render with.
///
/// The templates are compiled into the binary, and every `.html.tera`
/// template autoescapes its variables.
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    tera.add_raw_template(HOME_TEMPLATE, include_str!("../templates/index.html.tera"))?;
    Ok(tera)
}

fn render_home(
    templates: &Tera,
    films_path: &str,
    films: &[Film],
) -> Result<String, DataStoreError> {
    let films: Vec<Value> = films
        .iter()
        .map(|film| Value::Object(film.serialize()))
        .collect();
    let mut ctx = tera::Context::new();
    ctx.insert("films", &films);
    ctx.insert("films_path", films_path);
    templates.render(HOME_TEMPLATE, &ctx).map_err(|e| {
        tracing::error!(error = %e, template = HOME_TEMPLATE, "could not render");
        DataStoreError::Internal(format!("rendering {}: {}", HOME_TEMPLATE, e))
    })
}

/// `GET` on an index: the homepage listing films that match the query.
pub async fn home(
    films: &mut Collection<'_, Films>,
    params: &Params,
    templates: &Tera,
) -> Result<View, DataStoreError> {
    let filter = match FilmFilterSchema::deserialize(params) {
        Ok(filter) => filter,
        Err(errors) => return Ok(View::invalid(errors)),
    };
    let records = films.retrieve(&filter).await?;
    let path = films.node().path();
    let html = render_home(templates, &path, &records)?;
    Ok(View::html(StatusCode::OK, html))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resources::People;
    use crate::session::Session;
    use crate::sql::tests::setup_test_db;
    use crate::traversal::{Node, ResourceTree, TableKind};

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("test params must be an object"),
        }
    }

    fn collection_node(table: TableKind) -> Arc<Node> {
        Arc::clone(ResourceTree::catalog().collection(table).unwrap())
    }

    #[test]
    fn home_lists_titles_with_links() {
        let templates = templates().unwrap();
        let films = vec![Film {
            id: 2,
            title: "Con Air".to_string(),
            year: Some(1997),
            ..Default::default()
        }];
        let html = render_home(&templates, "/api/v1/films/", &films).unwrap();
        assert!(html.contains("<a href=\"/api/v1/films/2/\">Con Air</a> (1997)"));

        let html = render_home(&templates, "/api/v1/films/", &[]).unwrap();
        assert!(html.contains("No films."));
    }

    #[test]
    fn home_escapes_titles() {
        let templates = templates().unwrap();
        let films = vec![Film {
            id: 1,
            title: "<b>Tom & Jerry</b>".to_string(),
            ..Default::default()
        }];
        let html = render_home(&templates, "/api/v1/films/", &films).unwrap();
        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains(" ()"));
    }

    #[tokio::test]
    async fn create_sets_location_and_id() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        let mut people =
            Collection::<People>::new(collection_node(TableKind::People), &mut session);

        let view = create(&mut people, &params(json!({"name": "Nicolas Cage"})))
            .await
            .unwrap();
        assert_eq!(view.status(), StatusCode::CREATED);
        assert_eq!(view.location(), Some("/api/v1/people/1/"));
        assert_eq!(view.body(), Some(&json!({"id": 1})));

        let view = create(&mut people, &params(json!({"name": "Nicolas Cage"})))
            .await
            .unwrap();
        assert_eq!(view.status(), StatusCode::BAD_REQUEST);
        assert_eq!(view.body(), Some(&json!({})));
    }

    #[tokio::test]
    async fn create_reports_missing_references() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        let mut people =
            Collection::<People>::new(collection_node(TableKind::People), &mut session);

        let view = create(
            &mut people,
            &params(json!({"name": "Nicolas Cage", "cast_credits": [4]})),
        )
        .await
        .unwrap();
        assert_eq!(view.status(), StatusCode::BAD_REQUEST);
        assert_eq!(view.body(), Some(&json!({"cast_credits": "4 does not exist"})));
    }

    #[tokio::test]
    async fn empty_list_is_not_found() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        let mut people =
            Collection::<People>::new(collection_node(TableKind::People), &mut session);

        let view = list(&mut people, &Params::new()).await.unwrap();
        assert_eq!(view.status(), StatusCode::NOT_FOUND);
        assert_eq!(view.body(), Some(&json!([])));
    }

    #[tokio::test]
    async fn row_views_validate_the_id_segment() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        let node = Node::child(&collection_node(TableKind::People), "0");
        let mut row = Row::<People>::new(node, 0, &mut session);

        let view = retrieve(&mut row, &Params::new()).await.unwrap();
        assert_eq!(view.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            view.body(),
            Some(&json!({"id": "0 is less than minimum value 1"}))
        );
        let view = delete(&mut row, &Params::new()).await.unwrap();
        assert_eq!(view.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_row_is_not_found_and_delete_is_idempotent() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        let node = Node::child(&collection_node(TableKind::People), "5");
        let mut row = Row::<People>::new(node, 5, &mut session);

        let view = retrieve(&mut row, &Params::new()).await.unwrap();
        assert_eq!(view.status(), StatusCode::NOT_FOUND);
        assert_eq!(view.body(), Some(&json!({})));
        let view = delete(&mut row, &Params::new()).await.unwrap();
        assert_eq!(view.status(), StatusCode::OK);
        assert_eq!(view.body(), Some(&json!({})));
    }

    #[tokio::test]
    async fn retrieve_projects_requested_fields() {
        let pool = setup_test_db().await;
        let mut session = Session::begin(&pool).await.unwrap();
        {
            let mut people =
                Collection::<People>::new(collection_node(TableKind::People), &mut session);
            create(&mut people, &params(json!({"name": "Nicolas Cage"})))
                .await
                .unwrap();
        }
        let node = Node::child(&collection_node(TableKind::People), "1");
        let mut row = Row::<People>::new(node, 1, &mut session);

        let view = retrieve(&mut row, &params(json!({"fields": "name"})))
            .await
            .unwrap();
        assert_eq!(view.status(), StatusCode::OK);
        assert_eq!(view.body(), Some(&json!({"name": "Nicolas Cage"})));

        let view = update(&mut row, &params(json!({"favorite_color": "blue"})))
            .await
            .unwrap();
        assert_eq!(view.status(), StatusCode::BAD_REQUEST);
        assert_eq!(view.body(), Some(&json!({})));
    }
}
