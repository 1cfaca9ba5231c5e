//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end: frontier, HTTP sessions, extraction, the SQLite
//! index and alias publication. The operational log is captured through a
//! tracing layer so event counts can be asserted.

use normativa_crawler::config::{Config, CrawlerConfig, IndexConfig, LoaderConfig};
use normativa_crawler::crawler::{events, Coordinator, CrawlReport};
use normativa_crawler::storage::{DocumentStore, SqliteStore};
use normativa_crawler::UrlKind;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every logged event as its `event` name plus string fields
#[derive(Clone, Default)]
struct EventLog {
    records: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{:?}", value));
    }
}

impl<S: tracing::Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.records.lock().unwrap().push(fields);
    }
}

impl EventLog {
    fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    /// Counts events named `name`, optionally restricted to one url
    fn count(&self, name: &str, url: Option<&str>) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.get("event").map(String::as_str) == Some(name))
            .filter(|r| url.map_or(true, |u| r.get("url").map(String::as_str) == Some(u)))
            .count()
    }
}

/// Creates a test configuration crawling `seeds` into the database at `db_path`
fn create_test_config(seeds: Vec<String>, db_path: &Path, crawl_version: &str) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            concurrency: 3,
            max_depth: 2,
            max_pages_per_domain: 50,
        },
        loader: LoaderConfig {
            user_agent: "normativa-test/1.0".to_string(),
            navigation_timeout_ms: 5_000,
            body_timeout_ms: 1_000,
            backoff_ms: 1, // Very short for testing
        },
        index: IndexConfig {
            database_path: db_path.display().to_string(),
            base: "normativa".to_string(),
            crawl_version: Some(crawl_version.to_string()),
            snapshot_dir: None,
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn crawl(config: Config) -> (Arc<SqliteStore>, CrawlReport) {
    let store = Arc::new(SqliteStore::open(Path::new(&config.index.database_path)).unwrap());
    let report = Coordinator::new(config, store.clone())
        .run()
        .await
        .expect("crawl should complete");
    (store, report)
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Portal</title></head><body>
            <p>Normas legales vigentes</p>
            <a href="/ley-1">Ley 1</a>
            <a href="/ley-2?ref=home#inicio">Ley 2</a>
            <a href="https://external.test/otra">Externo</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/ley-1", "<title>Ley 1</title><p>Texto de la ley uno</p>").await;
    mount_page(&server, "/ley-2", "<title>Ley 2</title><p>Texto de la ley dos</p>").await;

    let mut config = create_test_config(
        vec![format!("{}/", base)],
        &dir.path().join("index.db"),
        "2024-01-01",
    );
    config.index.snapshot_dir = Some(dir.path().join("html"));

    let (store, report) = crawl(config).await;

    let port = url::Url::parse(&base).unwrap().port().unwrap();
    assert_eq!(report.domains, vec![format!("127.0.0.1:{}", port)]);
    assert_eq!(report.totals.pages_indexed, 3);
    assert_eq!(report.totals.failed, 0);

    assert_eq!(store.count_documents("normativa-2024-01-01").unwrap(), 3);
    assert_eq!(store.count_documents("normativa_canon").unwrap(), 3);
    assert_eq!(
        store.resolve_alias("normativa_current").unwrap(),
        "normativa-2024-01-01"
    );

    let ley = store
        .get_canonical("normativa_canon", &format!("{}/ley-2", base))
        .unwrap()
        .expect("query and fragment are stripped from the identity");
    assert_eq!(ley.current.title, "Ley 2");
    assert_eq!(ley.current.text, "Texto de la ley dos");
    assert_eq!(ley.version_history.len(), 1);

    // the external link never reached the frontier
    assert!(store
        .get_raw("normativa-2024-01-01", "https://external.test/otra")
        .unwrap()
        .is_none());

    assert!(dir
        .path()
        .join("html")
        .join(format!("127.0.0.1_{}__index.html", port))
        .exists());
}

#[tokio::test]
async fn test_asset_is_indexed_without_fetching() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<body><p>Descargas disponibles</p><a href="/files/Decreto.PDF">Decreto</a></body>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/Decreto.PDF"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", base)],
        &dir.path().join("index.db"),
        "2024-01-01",
    );
    let (store, report) = crawl(config).await;

    assert_eq!(report.totals.assets_indexed, 1);

    let asset_url = format!("{}/files/Decreto.PDF", base);
    let raw = store
        .get_raw("normativa-2024-01-01", &asset_url)
        .unwrap()
        .expect("asset should have a raw snapshot");
    assert_eq!(raw.kind, UrlKind::Asset);
    assert_eq!(raw.title, "");
    assert_eq!(raw.text, "");
    assert!(store
        .get_canonical("normativa_canon", &asset_url)
        .unwrap()
        .is_none());

    server.verify().await;
}

#[tokio::test]
async fn test_failing_page_does_not_stop_the_crawl() {
    let log = EventLog::default();
    let _guard = log.install();

    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<body><p>Índice de normas</p><a href="/caida">Caída</a><a href="/bien">Bien</a></body>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/caida"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/bien", "<p>Página que sí carga</p>").await;

    let config = create_test_config(
        vec![format!("{}/", base)],
        &dir.path().join("index.db"),
        "2024-01-01",
    );
    let (store, report) = crawl(config).await;

    let broken = format!("{}/caida", base);
    assert_eq!(log.count(events::PAGE_LOAD_FAILED, Some(&broken)), 1);
    assert_eq!(log.count(events::PAGE_LOAD_ATTEMPT, Some(&broken)), 3);
    assert_eq!(log.count(events::PAGE_LOAD_ERROR, Some(&broken)), 3);
    assert_eq!(log.count(events::PAGE_LOAD_FAILED, None), 1);

    assert_eq!(report.totals.pages_indexed, 2);
    assert_eq!(report.totals.failed, 1);
    assert!(store
        .get_raw("normativa-2024-01-01", &format!("{}/bien", base))
        .unwrap()
        .is_some());
    assert!(store
        .get_raw("normativa-2024-01-01", &broken)
        .unwrap()
        .is_none());

    assert_eq!(log.count(events::CRAWL_INIT, None), 1);
    assert_eq!(log.count(events::CRAWL_DONE, None), 1);
    assert_eq!(log.count(events::WORKER_STARTED, None), 3);
    assert_eq!(log.count(events::WORKER_STOPPED, None), 3);

    server.verify().await;
}

#[tokio::test]
async fn test_blocked_resource_is_not_retried() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<body><p>Galería de imágenes</p><a href="/logo">Logo</a></body>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/logo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(
        vec![format!("{}/", base)],
        &dir.path().join("index.db"),
        "2024-01-01",
    );
    let (_, report) = crawl(config).await;

    assert_eq!(report.totals.pages_indexed, 1);
    assert_eq!(report.totals.failed, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_domain_quota_caps_admissions() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();

    let links: String = (0..8)
        .map(|i| format!(r#"<a href="/doc-{}">Doc</a>"#, i))
        .collect();
    mount_page(&server, "/", &format!("<body><p>Listado general</p>{}</body>", links)).await;
    for i in 0..8 {
        mount_page(&server, &format!("/doc-{}", i), "<p>Documento de prueba</p>").await;
    }

    let mut config = create_test_config(
        vec![format!("{}/", base)],
        &dir.path().join("index.db"),
        "2024-01-01",
    );
    config.crawler.max_pages_per_domain = 4;
    let (store, report) = crawl(config).await;

    // the seed plus the first three links
    assert_eq!(report.totals.pages_indexed, 4);
    assert_eq!(store.count_documents("normativa-2024-01-01").unwrap(), 4);
    for i in 0..3 {
        assert!(store
            .get_raw("normativa-2024-01-01", &format!("{}/doc-{}", base, i))
            .unwrap()
            .is_some());
    }
}

#[tokio::test]
async fn test_recrawl_with_unchanged_content() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("index.db");

    mount_page(&server, "/", "<title>Inicio</title><p>Contenido que no cambia</p>").await;
    let seed = format!("{}/", base);

    for version in ["2024-01-01", "2024-01-02"] {
        crawl(create_test_config(vec![seed.clone()], &db, version)).await;
    }

    let store = SqliteStore::open(&db).unwrap();
    assert!(store.get_raw("normativa-2024-01-01", &seed).unwrap().is_some());
    assert!(store.get_raw("normativa-2024-01-02", &seed).unwrap().is_some());

    let canonical = store
        .get_canonical("normativa_canon", &seed)
        .unwrap()
        .unwrap();
    assert_eq!(canonical.version_history.len(), 1);
    assert_eq!(canonical.version_history[0].crawl_version, "2024-01-01");
    assert_eq!(canonical.meta.crawl_version, "2024-01-02");

    assert_eq!(
        store.alias_targets("normativa_current").unwrap(),
        vec!["normativa-2024-01-02".to_string()]
    );
}

#[tokio::test]
async fn test_changed_content_appends_history() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("index.db");
    let seed = format!("{}/", base);

    mount_page(&server, "/", "<p>Primera redacción del texto</p>").await;
    crawl(create_test_config(vec![seed.clone()], &db, "2024-01-01")).await;

    server.reset().await;
    mount_page(&server, "/", "<p>Segunda redacción del texto</p>").await;
    crawl(create_test_config(vec![seed.clone()], &db, "2024-01-02")).await;

    let store = SqliteStore::open(&db).unwrap();
    let canonical = store
        .get_canonical("normativa_canon", &seed)
        .unwrap()
        .unwrap();
    assert_eq!(canonical.version_history.len(), 2);
    assert_eq!(canonical.current.text, "Segunda redacción del texto");
}
