use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use ncmdb::{AppState, create_router, db};

async fn server() -> TestServer {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::migrate(&pool).await.unwrap();
    TestServer::new(create_router(AppState::new(pool).unwrap())).unwrap()
}

async fn create(server: &TestServer, collection: &str, body: Value) -> i64 {
    let response = server.post(collection).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn film_credits_are_visible_from_both_sides() {
    let server = server().await;
    let cage = create(&server, "/api/v1/people/", json!({"name": "Nicolas Cage"})).await;
    let travolta = create(&server, "/api/v1/people/", json!({"name": "John Travolta"})).await;
    let woo = create(&server, "/api/v1/people/", json!({"name": "John Woo"})).await;

    let film = create(
        &server,
        "/api/v1/films/",
        json!({
            "title": "Face/Off",
            "year": 1997,
            "running_time": 138,
            "rating": "R",
            "cast": [travolta, cage],
            "directors": [woo],
        }),
    )
    .await;

    let response = server.get(&format!("/api/v1/films/{}/", film)).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["cast"], json!(["John Travolta", "Nicolas Cage"]));
    assert_eq!(body["directors"], json!(["John Woo"]));
    assert_eq!(body["producers"], json!([]));
    assert_eq!(body["plot"], Value::Null);

    let response = server.get(&format!("/api/v1/people/{}/", cage)).await;
    let body = response.json::<Value>();
    assert_eq!(body["cast_credits"], json!(["Face/Off"]));
    assert_eq!(body["director_credits"], json!([]));
}

#[tokio::test]
async fn projection_returns_exactly_the_requested_fields() {
    let server = server().await;
    let film = create(
        &server,
        "/api/v1/films/",
        json!({"title": "Con Air", "year": 1997}),
    )
    .await;

    let response = server
        .get(&format!("/api/v1/films/{}/", film))
        .add_query_param("fields", "title,year")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"title": "Con Air", "year": 1997}));

    let response = server
        .get("/api/v1/films/")
        .add_query_param("fields", "id")
        .await;
    assert_eq!(response.json::<Value>(), json!([{"id": film}]));

    let response = server
        .get(&format!("/api/v1/films/{}/", film))
        .add_query_param("fields", "budget")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields.0"].is_string());
}

#[tokio::test]
async fn update_clears_keeps_and_rejects() {
    let server = server().await;
    let film = create(
        &server,
        "/api/v1/films/",
        json!({
            "title": "Matchstick Men",
            "plot": "A con artist meets his daughter.",
            "year": 2003,
        }),
    )
    .await;
    let path = format!("/api/v1/films/{}/", film);

    let response = server.put(&path).json(&json!({"plot": null})).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["plot"], Value::Null);
    assert_eq!(body["year"], json!(2003));
    assert_eq!(body["title"], json!("Matchstick Men"));

    let response = server.put(&path).json(&json!({"title": null})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({"title": "Required"}));

    let response = server.put(&path).json(&json!({"year": -1})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["year"].is_string());

    let response = server.put(&path).json(&json!({"budget": 1})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({}));

    let response = server.get(&path).await;
    assert_eq!(response.json::<Value>()["year"], json!(2003));
}

#[tokio::test]
async fn deleting_a_person_removes_their_credits() {
    let server = server().await;
    let cage = create(&server, "/api/v1/people/", json!({"name": "Nicolas Cage"})).await;
    let malkovich = create(&server, "/api/v1/people/", json!({"name": "John Malkovich"})).await;
    let film = create(
        &server,
        "/api/v1/films/",
        json!({"title": "Con Air", "cast": [cage, malkovich]}),
    )
    .await;

    server
        .delete(&format!("/api/v1/people/{}/", cage))
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/v1/people/{}/", cage))
        .await
        .assert_status_not_found();

    let response = server.get(&format!("/api/v1/films/{}/", film)).await;
    assert_eq!(response.json::<Value>()["cast"], json!(["John Malkovich"]));

    server
        .delete(&format!("/api/v1/people/{}/", cage))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn repeated_relation_filters_each_constrain() {
    let server = server().await;
    let cage = create(&server, "/api/v1/people/", json!({"name": "Nicolas Cage"})).await;
    let travolta = create(&server, "/api/v1/people/", json!({"name": "John Travolta"})).await;
    create(
        &server,
        "/api/v1/films/",
        json!({"title": "Face/Off", "cast": [cage, travolta]}),
    )
    .await;
    create(&server, "/api/v1/films/", json!({"title": "Con Air", "cast": [cage]})).await;

    let response = server
        .get("/api/v1/films/")
        .add_query_param("cast", "Nicolas Cage")
        .add_query_param("fields", "title")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!([{"title": "Face/Off"}, {"title": "Con Air"}])
    );

    let response = server
        .get("/api/v1/films/")
        .add_query_param("cast", "Nicolas Cage")
        .add_query_param("cast", "John Travolta")
        .add_query_param("fields", "title")
        .await;
    assert_eq!(response.json::<Value>(), json!([{"title": "Face/Off"}]));

    let response = server
        .get("/api/v1/films/")
        .add_query_param("cast", "Joan Allen")
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn bad_references_and_duplicates_are_rejected() {
    let server = server().await;
    let response = server
        .post("/api/v1/films/")
        .json(&json!({"title": "Face/Off", "cast": [99]}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({"cast": "99 does not exist"}));

    server
        .get("/api/v1/films/")
        .await
        .assert_status_not_found();

    create(&server, "/api/v1/people/", json!({"name": "Nicolas Cage"})).await;
    let response = server
        .post("/api/v1/people/")
        .json(&json!({"name": "Nicolas Cage"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({}));

    let response = server.get("/api/v1/people/").await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_film_titles_are_rejected() {
    let server = server().await;
    create(&server, "/api/v1/films/", json!({"title": "Con Air", "year": 1997})).await;
    let face_off = create(
        &server,
        "/api/v1/films/",
        json!({"title": "Face/Off", "year": 1997}),
    )
    .await;

    let response = server
        .post("/api/v1/films/")
        .json(&json!({"title": "Con Air"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({}));

    let response = server
        .put(&format!("/api/v1/films/{}/", face_off))
        .json(&json!({"title": "Con Air", "year": 2001}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({}));

    let response = server
        .get("/api/v1/films/")
        .add_query_param("fields", "title,year")
        .await;
    assert_eq!(
        response.json::<Value>(),
        json!([
            {"title": "Con Air", "year": 1997},
            {"title": "Face/Off", "year": 1997},
        ])
    );
}

#[tokio::test]
async fn credits_written_from_the_person_side() {
    let server = server().await;
    let con_air = create(&server, "/api/v1/films/", json!({"title": "Con Air"})).await;
    let face_off = create(&server, "/api/v1/films/", json!({"title": "Face/Off"})).await;
    let cage = create(
        &server,
        "/api/v1/people/",
        json!({
            "name": "Nicolas Cage",
            "cast_credits": [face_off, con_air],
            "producer_credits": [face_off],
        }),
    )
    .await;

    let response = server.get(&format!("/api/v1/films/{}/", con_air)).await;
    assert_eq!(response.json::<Value>()["cast"], json!(["Nicolas Cage"]));
    let response = server.get(&format!("/api/v1/films/{}/", face_off)).await;
    let body = response.json::<Value>();
    assert_eq!(body["cast"], json!(["Nicolas Cage"]));
    assert_eq!(body["producers"], json!(["Nicolas Cage"]));

    let response = server.get(&format!("/api/v1/people/{}/", cage)).await;
    assert_eq!(
        response.json::<Value>()["cast_credits"],
        json!(["Face/Off", "Con Air"])
    );
}

#[tokio::test]
async fn repeated_filter_values_keep_their_commas() {
    let server = server().await;
    let connick = create(
        &server,
        "/api/v1/people/",
        json!({"name": "Harry Connick, Jr."}),
    )
    .await;
    let hunter = create(&server, "/api/v1/people/", json!({"name": "Holly Hunter"})).await;
    create(
        &server,
        "/api/v1/films/",
        json!({"title": "Copycat", "cast": [connick, hunter]}),
    )
    .await;
    create(&server, "/api/v1/films/", json!({"title": "Con Air"})).await;

    let response = server
        .get("/api/v1/films/")
        .add_query_param("cast", "Harry Connick, Jr.")
        .add_query_param("cast", "Holly Hunter")
        .add_query_param("fields", "title")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([{"title": "Copycat"}]));

    let response = server
        .get("/api/v1/people/")
        .add_query_param("cast_credits", "Copycat")
        .add_query_param("cast_credits", "Copycat")
        .add_query_param("fields", "name")
        .await;
    assert_eq!(
        response.json::<Value>(),
        json!([{"name": "Harry Connick, Jr."}, {"name": "Holly Hunter"}])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_a_file_database_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("ncmdb.db").display());
    let pool = db::connect(&url, 5).await.unwrap();
    db::migrate(&pool).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState::new(pool).unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await });

    let client = reqwest::Client::new();
    for i in 1..=4 {
        let response = client
            .post(format!("http://{}/api/v1/people/", addr))
            .json(&json!({"name": format!("P{}", i)}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    let mut requests = tokio::task::JoinSet::new();
    for i in 0..40 {
        let put_client = client.clone();
        let url = format!("http://{}/api/v1/people/{}/", addr, i % 4 + 1);
        requests.spawn(async move {
            let response = put_client
                .put(&url)
                .json(&json!({"name": format!("Q{}", i)}))
                .send()
                .await
                .unwrap();
            (response.status(), response.text().await.unwrap())
        });
        let client = client.clone();
        let url = format!("http://{}/api/v1/people/", addr);
        requests.spawn(async move {
            let response = client.get(&url).send().await.unwrap();
            (response.status(), response.text().await.unwrap())
        });
    }
    while let Some(result) = requests.join_next().await {
        let (status, body) = result.unwrap();
        assert_eq!(status, reqwest::StatusCode::OK, "{}", body);
    }

    let people: Vec<Value> = client
        .get(format!("http://{}/api/v1/people/", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(people.len(), 4);
}
