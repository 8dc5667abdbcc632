//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small wiki and run full level passes
//! against it end-to-end.

mod mock_wiki;

use mock_wiki::*;
use serde_json::json;
use tempfile::TempDir;
use wiki_mirror::crawler::{load_seeds, Driver};
use wiki_mirror::fetcher::{ArticleInfo, Fetcher};
use wiki_mirror::output::write_repair_script;
use wiki_mirror::storage::{CrawlStore, NormalizationRecord, QueueEntry, SqliteStore};
use wiki_mirror::{EntryPath, LinkClassifier, MirrorError, Verify};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn driver(server: &MockServer, root: &TempDir) -> Driver<SqliteStore> {
    let config = test_config(server, root.path());
    let store = SqliteStore::open_in_memory().expect("Failed to open store");
    Driver::from_config(store, &config).expect("Failed to create driver")
}

fn seed(driver: &mut Driver<SqliteStore>, title: &str, level: i64) {
    driver
        .store_mut()
        .enqueue(&QueueEntry::waiting(SITE, title, level, Verify::Confirmed, 1))
        .expect("Failed to seed");
}

#[tokio::test]
async fn test_level_pass_mirrors_article_and_queues_links() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_article(
        &server,
        SITE,
        "10",
        "Foo",
        "Hello [[Foo/Bar]] and [[Baz]]",
        &Article {
            links: &["Foo/Bar", "Baz"],
            ..Article::default()
        },
    )
    .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Foo", 5);

    let report = driver.run_level(5).await.expect("Level pass failed");
    assert_eq!(report.fetched, 1);
    assert_eq!(report.errors, 0);

    let store = driver.store();
    let foo = store.get(SITE, "Foo").unwrap().expect("Foo row missing");
    let dir = match &foo.path {
        Some(EntryPath::Stored(dir)) => dir.clone(),
        other => panic!("Unexpected path {:?}", other),
    };
    assert_eq!(
        std::fs::read_to_string(dir.join("data.txt")).unwrap(),
        "Hello [[Foo/Bar]] and [[Baz]]"
    );

    let info = ArticleInfo::load(&dir.join("info.txt")).unwrap();
    assert_eq!(info.page_id, "10");
    assert_eq!(info.links(), ["Foo/Bar".to_string(), "Baz".to_string()]);
    let contributors = info.contributors.expect("Contributors missing");
    assert_eq!(contributors.users[0].name, "Editor");
    assert_eq!(contributors.anonymous, 2);

    let sub = store.get(SITE, "Foo/Bar").unwrap().unwrap();
    assert_eq!((sub.level, sub.verify, sub.attempts), (6, Verify::Discovered, 1));
    let baz = store.get(SITE, "Baz").unwrap().unwrap();
    assert_eq!(baz.level, 15);
    assert!(baz.path.is_none());

    // Discoveries are recorded but not fetched until confirmed
    assert!(store.pending_levels().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "revisions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(revision_reply("3", "Szablon:Box", "{{{1}}}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();

    let first = fetcher
        .fetch_article(SITE, "Szablon:Box", false, false)
        .await
        .unwrap();
    assert!(!first.status.done);
    assert!(first.info.links.is_none());

    let second = fetcher
        .fetch_article(SITE, "Szablon:Box", false, false)
        .await
        .unwrap();
    assert!(second.status.done);
    assert_eq!(second.dir, first.dir);
    assert_eq!(second.info, first.info);
}

#[tokio::test]
async fn test_redirect_leaves_only_canonical_row() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let mut reply = revision_reply("20", "New Title", "Moved here");
    reply["query"]["redirects"] = json!([{"from": "Old Title", "to": "New Title"}]);
    mount_revision(&server, SITE, "Old Title", reply).await;
    mount_properties(
        &server,
        SITE,
        "20",
        "New Title",
        &Article {
            redirects: &["Old Title", "Other Alias"],
            ..Article::default()
        },
    )
    .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Old Title", 1);

    let report = driver.run_level(1).await.unwrap();
    assert_eq!(report.fetched, 1);

    let store = driver.store();
    assert!(store.get(SITE, "Old Title").unwrap().is_none());

    let canonical = store.get(SITE, "New Title").unwrap().unwrap();
    assert!(matches!(canonical.path, Some(EntryPath::Stored(_))));
    assert_eq!(canonical.verify, Verify::Confirmed);
    assert_eq!(canonical.level, 1);

    let alias = store.get(SITE, "Other Alias").unwrap().unwrap();
    assert_eq!(alias.verify, Verify::Redirect);
    assert_eq!(alias.path, canonical.path);

    assert_eq!(
        store.normalizations().unwrap(),
        vec![NormalizationRecord {
            old_title: "Old Title".to_string(),
            new_title: "New Title".to_string(),
            site: SITE.to_string(),
        }]
    );

    let script = root.path().join("fixWikiLink.sh");
    let config = test_config(&server, root.path());
    assert_eq!(write_repair_script(store, &config.repair, &script).unwrap(), 1);
    assert_eq!(
        std::fs::read_to_string(&script).unwrap(),
        "fixWiki pl \"Old Title\" \"New Title\"\n"
    );
}

fn redirect_reply(from: &str, to: &str, id: &str) -> serde_json::Value {
    let mut reply = revision_reply(id, to, "Moved here");
    reply["query"]["redirects"] = json!([{"from": from, "to": to}]);
    reply
}

#[tokio::test]
async fn test_redirect_to_mirrored_title_is_served_from_cache() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "revisions"))
        .and(query_param("titles", "New Title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(revision_reply("20", "New Title", "Here")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "revisions"))
        .and(query_param("titles", "Old Title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(redirect_reply("Old Title", "New Title", "20")))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();
    let canonical = fetcher
        .fetch_article(SITE, "New Title", false, false)
        .await
        .unwrap();

    // No property mocks are mounted, so any further query would fail
    let found = fetcher
        .fetch_article(SITE, "Old Title", true, false)
        .await
        .unwrap();
    assert!(found.status.done);
    assert!(found.status.redirect);
    assert_eq!(found.title(), "New Title");
    assert_eq!(found.dir, canonical.dir);
    assert_eq!(
        std::fs::read_to_string(found.dir.join("data.txt")).unwrap(),
        "Here"
    );
}

#[tokio::test]
async fn test_stale_title_of_mirrored_article_is_replaced() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_revision(&server, SITE, "New Title", revision_reply("20", "New Title", "Here")).await;
    mount_revision(&server, SITE, "Old Title", redirect_reply("Old Title", "New Title", "20")).await;

    let mut driver = driver(&server, &root);
    let canonical = driver
        .fetcher()
        .fetch_article(SITE, "New Title", false, false)
        .await
        .unwrap();
    seed(&mut driver, "Old Title", 1);

    let report = driver.run_level(1).await.unwrap();
    assert_eq!(report.fetched, 1);

    let store = driver.store();
    assert!(store.get(SITE, "Old Title").unwrap().is_none());
    let row = store.get(SITE, "New Title").unwrap().unwrap();
    assert_eq!(row.path, Some(EntryPath::Stored(canonical.dir)));
    assert_eq!((row.level, row.verify), (1, Verify::Confirmed));
    assert_eq!(
        store.normalizations().unwrap(),
        vec![NormalizationRecord {
            old_title: "Old Title".to_string(),
            new_title: "New Title".to_string(),
            site: SITE.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_missing_page_is_terminal() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("titles", "Nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(missing_reply("Nope")))
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Nope", 3);

    let first = driver.run_level(3).await.unwrap();
    assert_eq!(first.missing, 1);

    let row = driver.store().get(SITE, "Nope").unwrap().unwrap();
    assert_eq!(row.path, Some(EntryPath::Missing));
    assert_eq!((row.level, row.verify, row.attempts), (3, Verify::Confirmed, 1));

    let second = driver.run_level(3).await.unwrap();
    assert_eq!(second.total(), 0);
}

#[tokio::test]
async fn test_template_failure_does_not_abort_article() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_article(
        &server,
        SITE,
        "30",
        "Foo",
        "{{Szablon:Zły}} {{Szablon:Dobry}}",
        &Article {
            templates: &["Szablon:Zły", "Szablon:Dobry"],
            ..Article::default()
        },
    )
    .await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("titles", "Szablon:Zły"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_revision(
        &server,
        SITE,
        "Szablon:Dobry",
        revision_reply("31", "Szablon:Dobry", "ok"),
    )
    .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Foo", 1);

    let report = driver.run_level(1).await.unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.errors, 0);

    let store = driver.store();
    assert!(matches!(
        store.get(SITE, "Foo").unwrap().unwrap().path,
        Some(EntryPath::Stored(_))
    ));
    assert!(store.get(SITE, "Szablon:Zły").unwrap().is_none());

    let good = store.get(SITE, "Szablon:Dobry").unwrap().unwrap();
    assert!(matches!(good.path, Some(EntryPath::Stored(_))));
    assert_eq!(good.verify, Verify::Discovered);
    assert_eq!(good.attempts, 1);
}

#[tokio::test]
async fn test_images_are_mirrored_with_article() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_article(
        &server,
        SITE,
        "40",
        "Foo",
        "[[Plik:Mapa.png]]",
        &Article {
            images: &["Plik:Mapa.png"],
            ..Article::default()
        },
    )
    .await;
    mount_prop(
        &server,
        SITE,
        "Plik:Mapa.png",
        "imageinfo",
        prop_reply(
            "41",
            "Plik:Mapa.png",
            "imageinfo",
            json!([{
                "user": "Editor",
                "userid": 7,
                "comment": "upload",
                "url": format!("{}/upload/Mapa.png", server.uri()),
                "descriptionurl": format!("{}/wiki/Plik:Mapa.png", server.uri())
            }]),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/upload/Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Plik:Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Mapa</html>"))
        .mount(&server)
        .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Foo", 2);

    let report = driver.run_level(2).await.unwrap();
    assert_eq!(report.fetched, 1);

    let image = driver.store().get(SITE, "Plik:Mapa.png").unwrap().unwrap();
    let dir = match image.path {
        Some(EntryPath::Stored(dir)) => dir,
        other => panic!("Unexpected image path {:?}", other),
    };
    assert_eq!(image.level, 2);
    assert_eq!(std::fs::read(dir.join("data.png")).unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);
    assert_eq!(
        std::fs::read_to_string(dir.join("info.html")).unwrap(),
        "<html>Mapa</html>"
    );
    assert!(dir.join("info.txt").is_file());
}

#[tokio::test]
async fn test_image_keeps_latest_revision_only() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let mut reply = prop_reply(
        "42",
        "Plik:Mapa.png",
        "imageinfo",
        json!([
            {
                "user": "Nowy",
                "userid": 8,
                "comment": "new version",
                "url": format!("{}/upload/new/Mapa.png", server.uri()),
                "descriptionurl": format!("{}/wiki/Plik:Mapa.png", server.uri())
            },
            {
                "user": "Stary",
                "userid": 9,
                "comment": "first upload",
                "url": format!("{}/upload/old/Mapa.png", server.uri()),
                "descriptionurl": format!("{}/wiki/Plik:Mapa.png", server.uri())
            }
        ]),
    );
    reply["continue"] = json!({"iistart": "2020-01-01T00:00:00Z", "continue": "||"});
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "imageinfo"))
        .and(query_param("iilimit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload/new/Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("NEW"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload/old/Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OLD"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Plik:Mapa.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Mapa</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();
    let image = fetcher.fetch_image(SITE, "Plik:Mapa.png").await.unwrap();

    assert_eq!(image.uploader(), Some("Nowy"));
    assert_eq!(std::fs::read_to_string(image.dir.join("data.png")).unwrap(), "NEW");

    let info: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(image.dir.join("info.txt")).unwrap())
            .unwrap();
    assert_eq!(info["comment"], "new version");
}

#[tokio::test]
async fn test_failed_image_fails_article() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_article(
        &server,
        SITE,
        "50",
        "Foo",
        "[[Plik:Zepsuty.png]]",
        &Article {
            images: &["Plik:Zepsuty.png"],
            ..Article::default()
        },
    )
    .await;
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("titles", "Plik:Zepsuty.png"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut driver = driver(&server, &root);
    seed(&mut driver, "Foo", 1);

    let report = driver.run_level(1).await.unwrap();
    assert_eq!(report.errors, 1);
    assert_eq!(
        driver.store().get(SITE, "Foo").unwrap().unwrap().path,
        Some(EntryPath::Error)
    );
}

#[tokio::test]
async fn test_links_follow_continuation() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    // The continuation page must be mounted first so it wins over the first page
    let rest = prop_reply("60", "Foo", "links", json!([{"ns": 0, "title": "Second"}]));
    Mock::given(method("GET"))
        .and(path(api_path(SITE)))
        .and(query_param("prop", "links"))
        .and(query_param("plcontinue", "60|0|Second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rest))
        .expect(1)
        .mount(&server)
        .await;

    let mut first = prop_reply("60", "Foo", "links", json!([{"ns": 0, "title": "First"}]));
    first["continue"] = json!({"plcontinue": "60|0|Second", "continue": "||"});
    mount_prop(&server, SITE, "Foo", "links", first).await;
    mount_article(&server, SITE, "60", "Foo", "text", &Article::default()).await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();
    let article = fetcher.fetch_article(SITE, "Foo", true, false).await.unwrap();

    assert_eq!(
        article.info.links(),
        ["First".to_string(), "Second".to_string()]
    );
}

#[tokio::test]
async fn test_language_links_are_filtered() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_prop(
        &server,
        SITE,
        "Foo",
        "langlinks",
        prop_reply(
            "70",
            "Foo",
            "langlinks",
            json!([{"lang": "en", "*": "Foo (en)"}, {"lang": "de", "*": "Foo (de)"}]),
        ),
    )
    .await;
    mount_prop(
        &server,
        SITE,
        "Foo",
        "iwlinks",
        prop_reply("70", "Foo", "iwlinks", json!([{"prefix": "b", "*": "Kucharz"}])),
    )
    .await;
    mount_article(&server, SITE, "70", "Foo", "text", &Article::default()).await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();
    let article = fetcher.fetch_article(SITE, "Foo", true, false).await.unwrap();

    assert_eq!(
        article.info.links(),
        ["b:Kucharz".to_string(), "en:Foo (en)".to_string()]
    );
}

#[tokio::test]
async fn test_unsupported_content_model_is_rejected() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let mut reply = revision_reply("80", "Foo.css", "body {}");
    reply["query"]["pages"]["80"]["revisions"][0]["contentmodel"] = json!("css");
    reply["query"]["pages"]["80"]["revisions"][0]["contentformat"] = json!("text/css");
    mount_revision(&server, SITE, "Foo.css", reply).await;

    let fetcher = Fetcher::from_config(&test_config(&server, root.path())).unwrap();
    let result = fetcher.fetch_article(SITE, "Foo.css", false, false).await;

    assert!(matches!(result, Err(MirrorError::Validation(_))));
}

#[tokio::test]
async fn test_seeded_store_crawls_all_levels() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_article(
        &server,
        SITE,
        "90",
        "Start",
        "[[Start/Next]]",
        &Article {
            links: &["Start/Next"],
            ..Article::default()
        },
    )
    .await;
    mount_article(&server, SITE, "91", "Start/Next", "end", &Article::default()).await;

    let mut config = test_config(&server, root.path());
    let manual = root.path().join("manual.txt");
    std::fs::write(&manual, "Start\n").unwrap();
    config.seeds.manual = manual.to_string_lossy().into_owned();
    config.seeds.ignore = root.path().join("none-ignore.txt").to_string_lossy().into_owned();
    config.seeds.auto = root.path().join("none-auto.txt").to_string_lossy().into_owned();

    let mut driver =
        Driver::from_config(SqliteStore::open_in_memory().unwrap(), &config).unwrap();
    load_seeds(
        driver.store_mut(),
        &LinkClassifier::from_config(&config.crawl),
        &config.seeds,
    )
    .unwrap();

    let reports = driver.run_all(config.crawl.max_level).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].level, 1);

    // The subpage waits at level 2 until an operator confirms it
    assert_eq!(driver.store_mut().confirm_level(2).unwrap(), 1);
    let reports = driver.run_all(config.crawl.max_level).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].fetched, 1);
    assert!(matches!(
        driver.store().get(SITE, "Start/Next").unwrap().unwrap().path,
        Some(EntryPath::Stored(_))
    ));
}
