//! Integration tests for the editor API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test gets its own temporary log tree,
//! data directory, group table, and changelog.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use warden_server::{AppState, WardenConfig, build_router};

const TYPES_V1: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<types>
    <type name="AKM">
        <nominal>10</nominal>
        <min>5</min>
        <flags count_in_cargo="0" count_in_hoarder="0" count_in_map="1" count_in_player="0" crafted="0" deloot="0"/>
        <category name="weapons"/>
        <usage name="Military"/>
    </type>
</types>
"#;

const TYPES_V2: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<types>
    <type name="AKM">
        <nominal>20</nominal>
        <min>5</min>
        <flags count_in_cargo="0" count_in_hoarder="0" count_in_map="1" count_in_player="0" crafted="0" deloot="0"/>
        <category name="weapons"/>
        <usage name="Military"/>
    </type>
    <type name="Apple">
        <nominal>40</nominal>
    </type>
</types>
"#;

struct Fixture {
    dir: TempDir,
    router: Router,
}

impl Fixture {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, String) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self.get(uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn put_record(&self, uri: &str, editor: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut request = Request::put(uri);
        if let Some(editor) = editor {
            request = request.header("x-editor-id", editor);
        }
        let (status, _, text) = self
            .send(request.body(Body::from(body.to_owned())).unwrap())
            .await;
        (status, serde_json::from_str(&text).unwrap())
    }
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn config_for(root: &Path) -> WardenConfig {
    let mut config = WardenConfig::default();
    config.paths.logs_dir = root.join("logs");
    config.paths.data_dir = root.join("data");
    config.paths.changelog = root.join("changelog.txt");
    config.paths.group_map = root.join("groups.json");
    config
}

fn fixture_with(adjust: impl FnOnce(&mut WardenConfig, &Path)) -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "logs/1/DayZServer_x64_2024-05-01_22-00-00.ADM",
        &[
            "AdminLog started on 2024-05-01 at 22:00:00",
            r#"22:10:00 | Player "Alice" (id=AAA= pos=<100.0, 12.0, 200.0>) Dug in Underground Stash"#,
            r#"23:59:59 | Player "Bob" (id=BBB= pos=<500.0, 3.0, 500.0>) Dug in Underground Stash"#,
            r#"00:00:01 | Player "Bob" (id=BBB= pos=<500.4, 3.0, 499.2>) Dug up Underground Stash"#,
        ]
        .join("\n"),
    );
    write(
        root,
        "logs/DayZServer_x64_2024-05-02_12-00-00.ADM",
        &[
            "AdminLog started on 2024-05-02 at 12:00:00",
            r#"12:05:00 | Player "Bobby" (id=BBB= pos=<100.5, 0.0, 200.9>) Dug up Underground Stash"#,
            r#"12:06:00 | Player "Carol" (id=CCC= pos=<900.0, 0.0, 900.0>) Dug up Underground Stash"#,
        ]
        .join("\n"),
    );
    write(root, "data/db/types.xml", TYPES_V1);
    write(root, "groups.json", r#"{"economy": "db"}"#);

    let mut config = config_for(root);
    adjust(&mut config, root);
    let state = Arc::new(AppState::from_config(config).unwrap());
    Fixture {
        router: build_router(state),
        dir,
    }
}

fn fixture() -> Fixture {
    fixture_with(|_, _| {})
}

// =========================================================================
// Status
// =========================================================================

#[tokio::test]
async fn status_reports_paths_and_cache() {
    let fx = fixture();
    let (status, json) = fx.get_json("/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["logFiles"], 2);
    assert_eq!(json["logExtension"], "ADM");
    assert_eq!(json["groupsLoaded"], false);
    assert_eq!(json["parsers"], serde_json::json!(["pattern", "structural"]));

    fx.get("/api/records/economy/types").await;
    let (_, json) = fx.get_json("/api/status").await;
    assert_eq!(json["groupsLoaded"], true);
}

// =========================================================================
// Stash report
// =========================================================================

#[tokio::test]
async fn stash_report_unbounded() {
    let fx = fixture();
    let (status, json) = fx.get_json("/api/logs/stash-report").await;
    assert_eq!(status, StatusCode::OK);

    let players = json["players"].as_array().unwrap();
    let ids: Vec<&str> = players.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["BBB=", "AAA=", "CCC="]);

    let bob = players.first().unwrap();
    assert_eq!(bob["dugIn"], 1);
    assert_eq!(bob["dugUpOwn"], 1);
    assert_eq!(bob["dugUpOthers"], 1);
    assert_eq!(bob["aliases"], serde_json::json!(["Bob", "Bobby"]));
}

#[tokio::test]
async fn stash_report_window_is_local_time() {
    let fx = fixture();
    let (status, json) = fx
        .get_json("/api/logs/stash-report?start=2024-05-02T00:00:00")
        .await;
    assert_eq!(status, StatusCode::OK);

    // Only the recoveries after local midnight remain, and none of them
    // has a burial left in the window to match.
    let players = json["players"].as_array().unwrap();
    assert!(players.iter().all(|p| p["dugIn"] == 0));
    assert!(players.iter().all(|p| p["dugUpOwn"] == 0 && p["dugUpOthers"] == 0));
}

#[tokio::test]
async fn stash_report_rejects_inverted_window() {
    let fx = fixture();
    let (status, json) = fx
        .get_json("/api/logs/stash-report?start=2024-05-03&end=2024-05-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("time window"));
}

#[tokio::test]
async fn stash_report_rejects_bad_datetime() {
    let fx = fixture();
    let (status, json) = fx.get_json("/api/logs/stash-report?start=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("yesterday"));
}

// =========================================================================
// Export
// =========================================================================

#[tokio::test]
async fn export_returns_header_and_lines() {
    let fx = fixture();
    let (status, headers, body) = fx
        .get("/api/logs/export?start=2024-05-02T12:00:00&end=2024-05-02T12:06:30")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"2024-05-02_12-00-00_to_2024-05-02_12-06-30.ADM\""
    );

    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(*lines.first().unwrap(), "AdminLog started on 2024-05-02 at 12:00:00");
    assert_eq!(lines.len(), 3);
    assert!(lines.get(1).unwrap().starts_with("12:05:00"));
    assert!(lines.get(2).unwrap().starts_with("12:06:00"));
}

#[tokio::test]
async fn export_reads_zulu_bounds_as_server_time() {
    let fx = fixture();
    let (status, headers, body) = fx
        .get("/api/logs/export?start=2024-05-02T12:00:00Z&end=2024-05-02T12:06:30Z")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"2024-05-02_12-00-00_to_2024-05-02_12-06-30.ADM\""
    );
    assert_eq!(body.lines().count(), 3);
}

#[tokio::test]
async fn export_requires_both_bounds() {
    let fx = fixture();
    let (status, json) = fx.get_json("/api/logs/export?start=2024-05-02").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("end"));
}

#[tokio::test]
async fn export_rejects_partial_spatial_filter() {
    let fx = fixture();
    let (status, _) = fx
        .get_json("/api/logs/export?start=2024-05-01&end=2024-05-03&x=100&radius=5")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fx
        .get_json("/api/logs/export?start=2024-05-01&end=2024-05-03&x=100&z=200&radius=-1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_spatial_and_expanded() {
    let fx = fixture();
    let base = "/api/logs/export?start=2024-05-01&end=2024-05-03&x=100&y=200&radius=2";

    let (status, _, nearby) = fx.get(base).await;
    assert_eq!(status, StatusCode::OK);
    let nearby: Vec<&str> = nearby.lines().skip(1).collect();
    assert_eq!(nearby.len(), 2);
    assert!(nearby.first().unwrap().contains("Alice"));
    assert!(nearby.get(1).unwrap().contains("Bobby"));

    let (status, _, expanded) = fx.get(&format!("{base}&expandByIds=true")).await;
    assert_eq!(status, StatusCode::OK);
    let expanded: Vec<&str> = expanded.lines().skip(1).collect();
    assert_eq!(expanded.len(), 4);
    assert!(expanded.first().unwrap().contains("Alice"));
    assert!(expanded.get(1).unwrap().starts_with("23:59:59"));
    assert!(expanded.get(2).unwrap().starts_with("00:00:01"));
    assert!(expanded.get(3).unwrap().contains("Bobby"));
    assert!(expanded.iter().all(|l| !l.contains("Carol")));
}

// =========================================================================
// Records and changelog
// =========================================================================

#[tokio::test]
async fn get_record_serves_raw_text() {
    let fx = fixture();
    let (status, _, body) = fx.get("/api/records/economy/types.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, TYPES_V1);

    let (status, _, _) = fx.get("/api/records/economy/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_record_writes_and_logs_changes() {
    let fx = fixture();
    let (status, json) = fx
        .put_record("/api/records/economy/types", Some("admin"), TYPES_V2)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["changes"], 2);

    let stored = std::fs::read_to_string(fx.root().join("data/db/types.xml")).unwrap();
    assert_eq!(stored, TYPES_V2);

    let (status, _, changelog) = fx.get("/api/changelog").await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = changelog.lines().collect();
    assert_eq!(*lines.first().unwrap(), "File: types.xml");
    assert!(lines.get(1).unwrap().ends_with(" - [admin] AKM modified [fields: Nominal(10 > 20)]"));
    assert!(lines.get(2).unwrap().ends_with(" - [admin] Apple added"));
    assert_eq!(*lines.get(3).unwrap(), "");
}

#[tokio::test]
async fn identical_write_adds_no_changelog_block() {
    let fx = fixture();
    let (status, json) = fx
        .put_record("/api/records/economy/types", None, TYPES_V1)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changes"], 0);

    let (_, _, changelog) = fx.get("/api/changelog").await;
    assert_eq!(changelog, "");
}

#[tokio::test]
async fn missing_editor_is_unknown() {
    let fx = fixture();
    fx.put_record("/api/records/economy/types", None, TYPES_V2)
        .await;
    let (_, _, changelog) = fx.get("/api/changelog").await;
    assert!(changelog.contains(" - [unknown] Apple added"));
}

#[tokio::test]
async fn new_record_file_reports_everything_added() {
    let fx = fixture();
    let (status, json) = fx
        .put_record("/api/records/economy/fresh", Some("ed"), TYPES_V2)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changes"], 2);
    assert!(fx.root().join("data/db/fresh.xml").exists());
}

#[tokio::test]
async fn put_record_validates_target() {
    let fx = fixture();
    let (status, json) = fx
        .put_record("/api/records/nowhere/types", Some("ed"), TYPES_V2)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);

    let (status, _) = fx
        .put_record("/api/records/economy/..types", Some("ed"), TYPES_V2)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn changelog_failure_keeps_the_write() {
    // The changelog path is a directory, so appending fails.
    let fx = fixture_with(|config, root| config.paths.changelog = root.join("data"));
    let (status, json) = fx
        .put_record("/api/records/economy/types", Some("ed"), TYPES_V2)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changes"], 2);

    let stored = std::fs::read_to_string(fx.root().join("data/db/types.xml")).unwrap();
    assert_eq!(stored, TYPES_V2);
}

// =========================================================================
// Group table
// =========================================================================

#[tokio::test]
async fn group_table_is_cached_until_reload() {
    let fx = fixture();
    let (status, _, _) = fx.get("/api/records/events/events").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    write(fx.root(), "groups.json", r#"{"economy": "db", "events": "env"}"#);
    write(fx.root(), "data/env/events.xml", "<events/>");
    let (status, _, _) = fx.get("/api/records/events/events").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = fx
        .send(Request::post("/api/groups/reload").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["groups"], 2);

    let (status, _, body) = fx.get("/api/records/events/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<events/>");
}
