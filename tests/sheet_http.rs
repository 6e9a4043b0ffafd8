//! Sheet sync against a mock Apps Script webhook.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use leadsync_lib::cli::{execute, Commands, ProfilesArgs};
use leadsync_lib::config::Config;
use leadsync_lib::table::CsvTable;
use leadsync_lib::sheet::dispatch::DispatchPolicy;
use leadsync_lib::sheet::normalize::RowNormalizer;
use leadsync_lib::sheet::transport::HttpTransport;
use leadsync_lib::sheet::SheetSync;

// =============================================================================
// Test Helpers
// =============================================================================

fn config_for(server: &MockServer) -> Config {
    let yaml = format!(
        "google_sheets:\n  webhook_url: \"{}/exec\"\n  retry_delay_secs: 0\n  batch_size: 2\n",
        server.uri()
    );
    Config::from_yaml(&yaml).unwrap()
}

fn write_leads(dir: &tempfile::TempDir, emails: &[&str]) -> PathBuf {
    let mut csv = String::from("first_name,last_name,email,company\n");
    for (i, email) in emails.iter().enumerate() {
        csv.push_str(&format!("Lead,{},{},Acme\n", i, email));
    }
    let path = dir.path().join("enriched_with_emails.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

async fn posted_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r: &Request| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// =============================================================================
// Sync Tests
// =============================================================================

#[tokio::test]
async fn test_sync_upserts_and_preserves_workflow_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"EMAIL": "a@acme.com", "STATUS": "Sent", "TEMPLATE USED": "v2", "NOTES": "call back"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = write_leads(&dir, &["A@Acme.com ", "b@acme.com", "c@acme.com"]);
    let sync = SheetSync::from_config(&config_for(&server)).unwrap();
    let report = sync.sync(&csv).await.unwrap();

    assert_eq!(report.remote_rows, 1);
    assert_eq!((report.inserts, report.updates), (2, 1));
    assert_eq!(report.delivered, 3);

    let bodies = posted_bodies(&server).await;
    assert_eq!(bodies.len(), 2, "three rows in batches of two");
    let first = &bodies[0]["data"][0];
    assert_eq!(first["STATUS"], "Sent");
    assert_eq!(first["TEMPLATE USED"], "v2");
    assert_eq!(first["NOTES"], "");
    assert_eq!(bodies[0]["data"][1]["STATUS"], "Pending");
    assert_eq!(bodies[1]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_batch_is_retried_then_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "error", "message": "sheet locked"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = write_leads(&dir, &["a@acme.com", "b@acme.com"]);
    let report = SheetSync::from_config(&config_for(&server))
        .unwrap()
        .sync(&csv)
        .await
        .unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(report.batches_dropped, 0);
    assert_eq!(posted_bodies(&server).await.len(), 2);
}

#[tokio::test]
async fn test_failing_batch_is_dropped_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = write_leads(&dir, &["a@acme.com"]);
    let report = SheetSync::from_config(&config_for(&server))
        .unwrap()
        .sync(&csv)
        .await
        .unwrap();

    assert_eq!(report.delivered, 0);
    assert_eq!(report.batches_dropped, 1);
    assert_eq!(posted_bodies(&server).await.len(), 3);
}

#[tokio::test]
async fn test_slow_fetch_fails_open_to_inserts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"EMAIL": "a@acme.com", "STATUS": "Sent"}]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = write_leads(&dir, &["a@acme.com"]);
    let config = config_for(&server);
    let endpoint = config.get_endpoint().map(str::to_string);
    let sync = SheetSync::new(
        HttpTransport::new(Duration::from_millis(200)).unwrap(),
        endpoint.clone(),
        endpoint,
        RowNormalizer::new("Hunter.io"),
        DispatchPolicy {
            retry_delay: Duration::ZERO,
            ..Default::default()
        },
    );
    let report = sync.sync(&csv).await.unwrap();

    assert_eq!(report.remote_rows, 0);
    assert_eq!((report.inserts, report.updates), (1, 0));
    assert_eq!(posted_bodies(&server).await[0]["data"][0]["STATUS"], "Pending");
}

#[tokio::test]
async fn test_malformed_remote_state_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = write_leads(&dir, &["a@acme.com", "b@acme.com"]);
    let report = SheetSync::from_config(&config_for(&server))
        .unwrap()
        .sync(&csv)
        .await
        .unwrap();

    assert_eq!(report.inserts, 2);
    assert_eq!(report.delivered, 2);
}

// =============================================================================
// Profiles Tests
// =============================================================================

#[tokio::test]
async fn test_profiles_command_skips_leads_already_in_sheet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"NAME": "Sam Lee", "EMAIL": "sam@figma.com", "STATUS": "Sent"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");
    let out = dir.path().join("scraper_output.csv");
    std::fs::write(
        &results,
        json!({"organic_results": [
            {"title": "Sam Lee | LinkedIn", "snippet": "PM at Figma", "link": "https://linkedin.com/in/sl"},
            {"title": "Jane Doe - Stripe", "snippet": "CTO at Stripe", "link": "https://linkedin.com/in/jd"}
        ]})
        .to_string(),
    )
    .unwrap();

    execute(
        Commands::Profiles(ProfilesArgs {
            results,
            out: Some(out.clone()),
        }),
        &config_for(&server),
    )
    .await
    .unwrap();

    let table = CsvTable::read(&out).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "first_name"), "Jane");
    assert_eq!(table.get(0, "domain"), "stripe.com");
}
