use axum::http::StatusCode;
use axum_test::TestServer;
use proptest::prelude::*;
use serde_json::{Value, json};

use ncmdb::schema::sequence;
use ncmdb::{AppState, Uri, create_router, db, validate_uri};

/// Property test strategies for generating test data
pub mod strategies {
    use super::*;
    use proptest::collection::vec;
    use proptest::option;
    use proptest::string::string_regex;

    /// Strategy for generating well-formed http(s)/ftp(s) URIs
    pub fn uri_strategy() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("http"), Just("https"), Just("ftp"), Just("ftps")],
            vec(string_regex(r"[a-z0-9]([a-z0-9-]{0,10}[a-z0-9])?").unwrap(), 1..4),
            string_regex(r"[a-z]{2,6}").unwrap(),
            option::of(1u16..=65535),
            option::of(string_regex(r"/[A-Za-z0-9_./-]{0,20}").unwrap()),
        )
            .prop_map(|(scheme, labels, tld, port, path)| {
                let mut uri = format!("{}://{}.{}", scheme, labels.join("."), tld);
                if let Some(port) = port {
                    uri.push_str(&format!(":{}", port));
                }
                if let Some(path) = path {
                    uri.push_str(&path);
                }
                uri
            })
    }

    /// Strategy for generating schemes the validator must refuse
    pub fn foreign_scheme_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[a-z]{2,8}")
            .unwrap()
            .prop_filter("not an accepted scheme", |s| {
                !["http", "https", "ftp", "ftps"].contains(&s.as_str())
            })
    }

    /// Strategy for generating list items without commas or surrounding space
    pub fn item_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z0-9][A-Za-z0-9 ]{0,10}[A-Za-z0-9]|[A-Za-z0-9]").unwrap()
    }

    /// Strategy for generating person names
    pub fn name_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Z][a-z]{1,10}( [A-Z][a-z']{1,12}){0,2}").unwrap()
    }
}

use strategies::*;

proptest! {
    #[test]
    fn generated_uris_are_accepted(uri in uri_strategy()) {
        prop_assert_eq!(validate_uri(&uri), Some(uri.as_str()));
        prop_assert!(Uri::parse(uri.clone()).is_some());
    }

    #[test]
    fn foreign_schemes_are_rejected(scheme in foreign_scheme_strategy(), uri in uri_strategy()) {
        let rest = uri.split_once("://").map(|(_, rest)| rest.to_string()).unwrap_or_default();
        let candidate = format!("{}://{}", scheme, rest);
        prop_assert_eq!(validate_uri(&candidate), None);
    }

    #[test]
    fn strings_without_a_scheme_are_rejected(s in "[A-Za-z0-9./ -]{0,40}") {
        prop_assert_eq!(validate_uri(&s), None);
    }

    #[test]
    fn comma_joined_items_split_back(items in proptest::collection::vec(item_strategy(), 0..6)) {
        let joined = items.join(", ");
        let expected: Vec<Value> = items.iter().cloned().map(Value::String).collect();
        prop_assert_eq!(sequence(&Value::String(joined)), expected);
    }

    #[test]
    fn sequence_is_idempotent(items in proptest::collection::vec("[a-z ,]{0,12}", 0..5)) {
        let value = Value::Array(items.into_iter().map(Value::String).collect());
        let once = sequence(&value);
        prop_assert_eq!(sequence(&Value::Array(once.clone())), once.clone());
        for item in once {
            prop_assert!(!item.as_str().unwrap_or_default().trim().is_empty());
        }
    }

    #[test]
    fn split_items_are_trimmed_and_comma_free(s in "[a-z ,]{0,40}") {
        for item in sequence(&Value::String(s)) {
            let item = item.as_str().unwrap_or_default().to_string();
            prop_assert!(!item.is_empty());
            prop_assert!(!item.contains(','));
            prop_assert_eq!(item.trim(), item.as_str());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn created_people_read_back(name in name_strategy()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let pool = db::connect("sqlite::memory:", 1).await.unwrap();
            db::migrate(&pool).await.unwrap();
            let server = TestServer::new(create_router(AppState::new(pool).unwrap())).unwrap();

            let response = server.post("/api/v1/people/").json(&json!({"name": &name})).await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
            let id = response.json::<Value>()["id"].as_i64().unwrap();
            assert_eq!(response.header("location"), format!("/api/v1/people/{}/", id).as_str());

            let response = server.get(&format!("/api/v1/people/{}/", id)).await;
            assert_eq!(response.json::<Value>()["name"], json!(name));
        });
    }
}
