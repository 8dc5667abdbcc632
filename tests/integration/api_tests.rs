//! Integration tests for the API client against a mock wiki

mod mock_wiki;

use mock_wiki::*;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiki_mirror::api::{ApiClient, PropQuery};
use wiki_mirror::output::{dump_users, user_list_path};
use wiki_mirror::MirrorError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEMPLATES: PropQuery<'static> = PropQuery::new("templates", "tl");

fn client(server: &MockServer) -> ApiClient {
    let root = TempDir::new().unwrap();
    let config = test_config(server, root.path());
    ApiClient::new(&config.api, &config.user_agent).expect("Failed to build client")
}

#[tokio::test]
async fn test_server_error_is_remote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    match session.revision("Foo").await {
        Err(MirrorError::Remote { status, .. }) => assert_eq!(status, 500),
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_object_is_protocol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": "badtitle", "info": "Bad title \"<>\"."}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    assert!(matches!(
        session.revision("<>").await,
        Err(MirrorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_property_reply_with_other_title_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prop_reply(
            "5",
            "Something Else",
            "templates",
            json!([{"ns": 10, "title": "Szablon:Box"}]),
        )))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    assert!(matches!(
        session.query_titles("Foo", None, &TEMPLATES).await,
        Err(MirrorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_property_reply_with_several_pages_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"pages": {
                "5": {"pageid": 5, "ns": 0, "title": "Foo", "templates": []},
                "6": {"pageid": 6, "ns": 0, "title": "Bar", "templates": []}
            }}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    assert!(matches!(
        session.query_titles("Foo", None, &TEMPLATES).await,
        Err(MirrorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_known_page_id_selects_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"pages": {
                "5": {"pageid": 5, "ns": 0, "title": "Foo",
                      "templates": [{"ns": 10, "title": "Szablon:Box"}]},
                "6": {"pageid": 6, "ns": 0, "title": "Bar", "templates": []}
            }}
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    let titles = session
        .query_titles("Foo", Some("5"), &TEMPLATES)
        .await
        .unwrap();
    assert_eq!(titles, vec!["Szablon:Box".to_string()]);
}

#[tokio::test]
async fn test_repeated_continuation_is_rejected() {
    let server = MockServer::start().await;
    let mut reply = prop_reply("5", "Foo", "links", json!([{"ns": 0, "title": "Bar"}]));
    reply["continue"] = json!({"plcontinue": "5|0|Bar", "continue": "||"});
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.session(SITE).unwrap();

    assert!(matches!(
        session
            .query_titles("Foo", None, &PropQuery::new("links", "pl"))
            .await,
        Err(MirrorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_user_dump_follows_continuation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("list", "allusers"))
        .and(query_param("aufrom", "Marta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"allusers": [{"userid": 3, "name": "Marta", "editcount": 4}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("list", "allusers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "continue": {"aufrom": "Marta", "continue": "-||"},
            "query": {"allusers": [
                {"userid": 1, "name": "Adam", "editcount": 12},
                {"userid": 2, "name": "Ewa", "editcount": 1}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let client = client(&server);

    let written = dump_users(&client, SITE, root.path(), None, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(written, 3);

    let dump = std::fs::read_to_string(user_list_path(root.path(), SITE)).unwrap();
    assert!(dump.contains("\"Adam\""));
    assert!(dump.contains("\"Marta\""));
    assert!(dump.find("Ewa").unwrap() < dump.find("Marta").unwrap());
}

#[tokio::test]
async fn test_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upload/a/ab/Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let client = client(&server);

    let bytes = client
        .download(&format!("{}/upload/a/ab/Mapa.png", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    assert!(matches!(
        client.download(&format!("{}/upload/nothing.png", server.uri())).await,
        Err(MirrorError::Remote { status: 404, .. })
    ));
}
