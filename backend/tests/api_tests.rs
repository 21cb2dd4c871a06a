use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::jobs::JobStatus;
use common::model::datasource::DatasetSummary;
use common::model::log::{Contact, LogEntry};
use common::model::merge::{DispatchOutcome, DispatchSummary};
use common::model::place_holder::MappingReport;
use common::model::template::Template;
use mailflow::clients::send::HttpSendEndpoint;
use mailflow::config::Config;
use mailflow::job_controller::state::{start_job_updater, JobsState};
use mailflow::services;
use mailflow::services::data_sources::DatasetsState;
use mailflow::store::Store;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "mailflow-test-boundary";
const CSV: &str = "Name,Code,Email\nAnn,123,a@x.com\nBob,456,b@x.com\nCid,789,c@x.com\n";

struct Harness {
    _dir: TempDir,
    config: Config,
    store: Store,
    endpoint: HttpSendEndpoint,
    jobs: JobsState,
    datasets: DatasetsState,
}

fn harness(server: &MockServer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_path: dir.path().join("api.sqlite").display().to_string(),
        send_endpoint_url: format!("{}/send-emails", server.uri()),
        user_key: "key-123".into(),
        batch_size: 2,
        batch_delay_ms: 0,
        ..Config::default()
    };
    let store = Store::open(&config.database_path).unwrap();
    let endpoint =
        HttpSendEndpoint::new(config.send_endpoint_url.clone(), Duration::from_secs(5)).unwrap();
    let (jobs, rx) = JobsState::new();
    actix_web::rt::spawn(start_job_updater(jobs.clone(), rx));

    Harness {
        _dir: dir,
        config,
        store,
        endpoint,
        jobs,
        datasets: DatasetsState::default(),
    }
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.config.clone()))
                .app_data(web::Data::new($h.store.clone()))
                .app_data(web::Data::new($h.endpoint.clone()))
                .app_data(web::Data::new($h.jobs.clone()))
                .app_data(web::Data::new($h.datasets.clone()))
                .service(services::templates::configure_routes())
                .service(services::data_sources::csv::configure_routes())
                .service(services::merge::configure_routes())
                .service(services::logs::configure_routes())
                .service(services::contacts::configure_routes()),
        )
        .await
    };
}

fn template() -> Template {
    Template {
        id: "welcome".into(),
        name: "Welcome".into(),
        subject: "Your code".into(),
        from_name: "Acme".into(),
        reply_to: None,
        cc: None,
        bcc: None,
        to_email: None,
        content: r#"<p onclick="x()">Hi {{name}}, your code is {{code}}</p><script>alert(1)</script>"#
            .into(),
    }
}

fn upload_request(filename: &str, content: &str) -> test::TestRequest {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    test::TestRequest::post()
        .uri("/api/data_sources/csv/upload")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

async fn mount_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/send-emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

/// Test: Templates can be saved, read, listed, inspected and deleted
#[actix_web::test]
async fn test_template_crud() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/templates/save")
        .set_json(template())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/templates/welcome").to_request();
    let fetched: Template = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, template());

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let listed: Vec<Template> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/templates/welcome/placeholders")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["placeholders"], json!(["name", "code"]));

    let req = test::TestRequest::delete().uri("/api/templates/welcome").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/templates/welcome").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

/// Test: Uploads are parsed, summarised and addressable by content hash
#[actix_web::test]
async fn test_csv_upload() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let app = app!(h);

    let summary: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("people.csv", CSV).to_request()).await;
    assert_eq!(summary.headers, vec!["Name", "Code", "Email"]);
    assert_eq!(summary.row_count, 3);
    assert_eq!(summary.dataset_id.len(), 32);

    let again: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("copy.csv", CSV).to_request()).await;
    assert_eq!(again.dataset_id, summary.dataset_id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/data_sources/csv/{}", summary.dataset_id))
        .to_request();
    let fetched: DatasetSummary = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, summary);

    let resp = test::call_service(&app, upload_request("people.txt", CSV).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, upload_request("dup.csv", "a,a\n1,2\n").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// Test: Mapping and preview of an uploaded dataset against a stored template
#[actix_web::test]
async fn test_mapping_and_preview() {
    let server = MockServer::start().await;
    let h = harness(&server);
    h.store.save_template(&template()).unwrap();
    let app = app!(h);

    let summary: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("people.csv", CSV).to_request()).await;
    let selection = json!({ "template_id": "welcome", "dataset_id": summary.dataset_id });

    let req = test::TestRequest::post()
        .uri("/api/merge/mapping")
        .set_json(&selection)
        .to_request();
    let report: MappingReport = test::call_and_read_body_json(&app, req).await;
    assert!(report.is_complete());
    assert_eq!(report.email_column.as_deref(), Some("Email"));
    assert_eq!(report.name_column.as_deref(), Some("Name"));

    let req = test::TestRequest::post()
        .uri("/api/merge/preview")
        .set_json(json!({ "template_id": "welcome", "dataset_id": summary.dataset_id, "row": 1 }))
        .to_request();
    let preview: Value = test::call_and_read_body_json(&app, req).await;
    let html = preview["html"].as_str().unwrap();
    assert!(html.contains("Hi Bob, your code is 456"));
    assert!(!html.contains("<script"));
    assert!(!html.contains("onclick"));
    assert_eq!(preview["to"], "b@x.com");
    assert_eq!(preview["subject"], "Your code");

    let req = test::TestRequest::post()
        .uri("/api/merge/preview")
        .set_json(json!({
            "template_id": "welcome",
            "dataset_id": summary.dataset_id,
            "document": true
        }))
        .to_request();
    let page = test::call_and_read_body(&app, req).await;
    let page = String::from_utf8(page.to_vec()).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("Hi Ann, your code is 123"));

    let req = test::TestRequest::post()
        .uri("/api/merge/mapping")
        .set_json(json!({
            "template_id": "welcome",
            "dataset_id": summary.dataset_id,
            "assignments": { "code": "Zip" }
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/merge/mapping")
        .set_json(json!({ "template_id": "welcome", "dataset_id": "nope" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

/// Test: A test send returns the recipient outcome and writes a log row
#[actix_web::test]
async fn test_single_test_send() {
    let server = MockServer::start().await;
    mount_success(&server).await;
    let h = harness(&server);
    h.store.save_template(&template()).unwrap();
    let app = app!(h);

    let summary: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("people.csv", CSV).to_request()).await;
    let req = test::TestRequest::post()
        .uri("/api/merge/test")
        .set_json(json!({
            "template_id": "welcome",
            "dataset_id": summary.dataset_id,
            "service_id": "svc",
            "row": 2
        }))
        .to_request();
    let outcome: DispatchOutcome = test::call_and_read_body_json(&app, req).await;
    assert!(outcome.success);
    assert_eq!(outcome.email_address, "c@x.com");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["user_key"], "key-123");
    assert_eq!(body["parameters"]["code"], "789");

    let req = test::TestRequest::get()
        .uri("/api/logs?template_id=welcome")
        .to_request();
    let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].email_address, "c@x.com");
    assert_eq!(logs[0].name, "Cid");
    assert_eq!(logs[0].template_name, "Welcome");
}

/// Test: Sent recipients can be searched, filtered by day and exported as CSV
#[actix_web::test]
async fn test_contacts_listing_and_export() {
    let server = MockServer::start().await;
    mount_success(&server).await;
    let h = harness(&server);
    h.store.save_template(&template()).unwrap();
    let app = app!(h);

    let summary: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("people.csv", CSV).to_request()).await;
    for row in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/merge/test")
            .set_json(json!({
                "template_id": "welcome",
                "dataset_id": summary.dataset_id,
                "service_id": "svc",
                "row": row
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/api/contacts?order=asc").to_request();
    let contacts: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Ann", "Bob"]);
    assert_eq!(contacts[0].template_name, "Welcome");

    let req = test::TestRequest::get().uri("/api/contacts?search=BOB").to_request();
    let contacts: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].email_address, "b@x.com");

    let req = test::TestRequest::get()
        .uri("/api/contacts?date=2000-01-01")
        .to_request();
    let contacts: Vec<Contact> = test::call_and_read_body_json(&app, req).await;
    assert!(contacts.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/contacts?date=yesterday")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/contacts/export?search=welcome&order=asc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"contacts_"));
    let body = test::read_body(resp).await;
    let csv = std::str::from_utf8(&body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Sent Time,Email Address,Name,Template");
    assert!(lines[1].ends_with(",\"a@x.com\",\"Ann\",\"Welcome\""));
}

/// Test: Logs default to the last day and can be sorted by status
#[actix_web::test]
async fn test_log_listing_filters() {
    let server = MockServer::start().await;
    let h = harness(&server);
    h.store
        .record_outcomes(
            "welcome",
            "svc",
            &[
                DispatchOutcome::sent("a@x.com", "ok"),
                DispatchOutcome::failed("b@x.com", "bounced"),
            ],
        )
        .unwrap();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri("/api/logs?all=true&sort=status&order=asc")
        .to_request();
    let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
    let statuses: Vec<&str> = logs.iter().map(|l| l.status.as_str()).collect();
    assert_eq!(statuses, ["failed", "sent"]);
    assert_eq!(logs[0].template_name, "Unknown Template");

    let req = test::TestRequest::get()
        .uri("/api/logs?date=2000-01-01&all=true")
        .to_request();
    let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
    assert!(logs.is_empty());

    let req = test::TestRequest::get().uri("/api/logs?sort=name").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

/// Test: A bulk run goes through the job controller to a final report
#[actix_web::test]
async fn test_bulk_run_reports_results() {
    let server = MockServer::start().await;
    mount_success(&server).await;
    let h = harness(&server);
    h.store.save_template(&template()).unwrap();
    let app = app!(h);

    let summary: DatasetSummary =
        test::call_and_read_body_json(&app, upload_request("people.csv", CSV).to_request()).await;
    let req = test::TestRequest::post()
        .uri("/api/merge/start")
        .set_json(json!({
            "template_id": "welcome",
            "dataset_id": summary.dataset_id,
            "service_id": "svc"
        }))
        .to_request();
    let started: Value = test::call_and_read_body_json(&app, req).await;
    let job_id = started["job_id"].as_str().unwrap().to_string();

    let mut status = JobStatus::Pending;
    for _ in 0..200 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/merge/status/{}", job_id))
            .to_request();
        status = test::call_and_read_body_json(&app, req).await;
        if status.is_finished() {
            break;
        }
        actix_web::rt::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, JobStatus::Completed("Sent to 3 of 3 recipients".into()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/merge/results/{}", job_id))
        .to_request();
    let report: DispatchSummary = test::call_and_read_body_json(&app, req).await;
    assert!(report.completed);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.outcomes[0].email_address, "a@x.com");

    // Batch size 2 over three rows.
    assert_eq!(server.received_requests().await.unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/logs").to_request();
    let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(logs.len(), 3);

    let req = test::TestRequest::post()
        .uri(&format!("/api/merge/cancel/{}", job_id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

/// Test: Unknown jobs are reported as not found
#[actix_web::test]
async fn test_unknown_job() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let app = app!(h);

    for uri in ["/api/merge/status/missing", "/api/merge/results/missing"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
