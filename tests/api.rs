mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use vulnscan::auth::Role;
use vulnscan::llm::gemini::GeminiProvider;

use common::{body_bytes, body_json, request, FakeLlm, TestApp};

const REPORT_XML: &str = r#"<get_reports_response status="200" status_text="OK">
    <report id="r1">
        <name>2024-03-02T10:00:00Z</name>
        <task id="t1"><name>Weekly</name></task>
        <report id="r1">
            <scan_run_status>Done</scan_run_status>
            <vulns><count>1</count></vulns>
            <results>
                <result id="res1">
                    <host>10.0.0.5</host>
                    <port>443/tcp</port>
                    <threat>High</threat>
                    <severity>9.8</severity>
                    <description>Remote code execution, CVE-2021-44228.</description>
                </result>
            </results>
        </report>
    </report>
</get_reports_response>"#;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let response = app.send(request("GET", "/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "vulnscan");
}

#[tokio::test]
async fn test_signup_then_signin() {
    let app = TestApp::new();
    let signup = json!({"username": "alice", "email": "Alice@Example.com", "password": "s3cret!"});
    let response = app.send(request("POST", "/auth/signup", None, Some(signup.clone()))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["user_id"].as_i64().unwrap();

    let response = app.send(request("POST", "/auth/signup", None, Some(signup))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["type"], "ConflictError");

    let bad = json!({"email": "alice@example.com", "password": "wrong"});
    let response = app.send(request("POST", "/auth/signin", None, Some(bad))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let good = json!({"email": "alice@example.com", "password": "s3cret!"});
    let response = app.send(request("POST", "/auth/signin", None, Some(good))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    let token = body["access_token"].as_str().unwrap().to_string();

    let response = app.send(request("GET", "/auth/get_user", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"], user_id);
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn test_signup_missing_field() {
    let app = TestApp::new();
    let response = app
        .send(request("POST", "/auth/signup", None, Some(json!({"username": "bob", "email": "b@x.io"}))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "password is required");
}

#[tokio::test]
async fn test_admin_routes_guarded() {
    let app = TestApp::new();
    let response = app.send(request("GET", "/auth/get_users", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(request("GET", "/auth/get_users", Some("not-a-jwt"), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = app.token_for("carol", Role::User);
    let response = app.send(request("GET", "/auth/get_users", Some(&user), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = app.token_for("root", Role::Admin);
    let response = app.send(request("GET", "/auth/get_users", Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_last_admin_cannot_be_deleted() {
    let app = TestApp::new();
    let admin = app.token_for("root", Role::Admin);
    let response = app.send(request("DELETE", "/auth/delete_user/1", Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.send(request("DELETE", "/auth/delete_user/99", Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let app = TestApp::new();
    let admin = app.token_for("root", Role::Admin);
    let response = app
        .send(request("PUT", "/auth/modify_user/1", Some(&admin), Some(json!({"role": "user"}))))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Cannot demote the last admin");
}

#[tokio::test]
async fn test_stale_user_token_is_not_admin() {
    let app = TestApp::new();
    let stale = app.token_for("carol", Role::User);
    app.token_for("dave", Role::User);
    let promote = vulnscan::db::UserUpdate { role: Some(Role::Admin), ..Default::default() };
    app.state.db.update_user(1, &promote).unwrap();

    // The stored role is ADMIN now, but the token still claims USER.
    let response = app
        .send(request("PUT", "/auth/modify_user/2", Some(&stale), Some(json!({"comment": "x"}))))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.send(request("GET", "/auth/get_users", Some(&stale), None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_cannot_promote_self() {
    let app = TestApp::new();
    let user = app.token_for("dave", Role::User);
    let response = app
        .send(request("PUT", "/auth/modify_user/1", Some(&user), Some(json!({"role": "admin"}))))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_group_lifecycle() {
    let app = TestApp::new();
    let admin = app.token_for("root", Role::Admin);

    let response = app
        .send(request("POST", "/groups/create_group", Some(&admin), Some(json!({"group_name": "dmz"}))))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group_id = body_json(response).await["group_id"].as_i64().unwrap();

    let response = app
        .send(request("POST", "/groups/create_group", Some(&admin), Some(json!({"group_name": "dmz"}))))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let target = json!({"name": "web", "ip_address": "10.0.0.8", "group_id": group_id});
    let response = app.send(request("POST", "/groups/add_target", Some(&admin), Some(target))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let target_id = body_json(response).await["target_id"].as_i64().unwrap();

    let uri = format!("/groups/get_group_targets/{}", group_id);
    let response = app.send(request("GET", &uri, Some(&admin), None)).await;
    let targets = body_json(response).await;
    assert_eq!(targets.as_array().unwrap().len(), 1);
    assert_eq!(targets[0]["ip_address"], "10.0.0.8");

    let uri = format!("/groups/delete_group/{}", group_id);
    let response = app.send(request("DELETE", &uri, Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let orphan = app.state.db.get_target(target_id).unwrap().unwrap();
    assert_eq!(orphan.group_id, None);

    let response = app.send(request("GET", "/groups/get_groups", Some(&admin), None)).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_target_to_missing_group() {
    let app = TestApp::new();
    let admin = app.token_for("root", Role::Admin);
    let target = json!({"name": "web", "ip_address": "10.0.0.8", "group_id": 42});
    let response = app.send(request("POST", "/groups/add_target", Some(&admin), Some(target))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_reports_wrapped() {
    let app = TestApp::new();
    app.scanner.reply("get_reports", REPORT_XML);
    let token = app.token_for("eve", Role::User);

    let response = app.send(request("GET", "/scanner/get_reports", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reports"][0]["id"], "r1");
    assert_eq!(body["reports"][0]["task_id"], "t1");

    let sent = app.scanner.sent.lock().unwrap().clone();
    assert!(sent[0].starts_with("<authenticate><credentials><username>admin</username>"));
}

#[tokio::test]
async fn test_export_csv() {
    let app = TestApp::new();
    app.scanner.reply("get_reports", REPORT_XML);
    let token = app.token_for("eve", Role::User);

    let response = app.send(request("GET", "/scanner/export_report/r1/csv", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"report_r1.csv\""
    );
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ID,Host,Port,Description,CVE Numbers,Severity,Threat"));
    assert!(lines.next().unwrap().starts_with("res1,10.0.0.5,443,"));
}

#[tokio::test]
async fn test_export_pdf_and_xlsx_magic() {
    let app = TestApp::new();
    app.scanner.reply("get_reports", REPORT_XML);
    let token = app.token_for("eve", Role::User);

    let response = app.send(request("GET", "/scanner/export_report/r1/pdf", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"%PDF"));

    let response = app.send(request("GET", "/scanner/export_report/r1/xlsx", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"PK"));
}

#[tokio::test]
async fn test_export_unsupported_format_skips_scanner() {
    let app = TestApp::new();
    let token = app.token_for("eve", Role::User);

    let response = app.send(request("GET", "/scanner/export_report/r1/docx", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Unsupported format");
    assert!(app.scanner.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_scanner_not_found_maps_to_404() {
    let app = TestApp::new();
    app.scanner.reply(
        "delete_task",
        r#"<delete_task_response status="404" status_text="Failed to find task 'nope'"/>"#,
    );
    let admin = app.token_for("root", Role::Admin);

    let response = app.send(request("DELETE", "/scanner/delete_task/nope", Some(&admin), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Error 404: Failed to find task 'nope'");
}

#[tokio::test]
async fn test_scanner_fault_maps_to_500() {
    let app = TestApp::new();
    let token = app.token_for("eve", Role::User);

    // No scripted reply, so the fake scanner rejects the command with a 400.
    let response = app.send(request("GET", "/scanner/get_tasks", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Error 400: Bogus command name");
}

#[tokio::test]
async fn test_batch_tasks_reports_each_item() {
    let app = TestApp::new();
    app.scanner
        .reply("start_task", r#"<start_task_response status="202" status_text="OK, request submitted"/>"#)
        .reply("start_task", r#"<start_task_response status="404" status_text="Failed to find task"/>"#);
    let admin = app.token_for("root", Role::Admin);

    let batch = json!({"action": "start", "task_ids": ["t1", "t2"]});
    let response = app.send(request("POST", "/scanner/batch_tasks", Some(&admin), Some(batch))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"][0]["ok"], true);
    assert_eq!(body["results"][0]["status"], "202");
    assert_eq!(body["results"][1]["ok"], false);
    assert_eq!(app.scanner.sent_named("start_task").len(), 2);
}

#[tokio::test]
async fn test_create_target_validates_and_escapes() {
    let app = TestApp::new();
    app.scanner.reply(
        "create_target",
        r#"<create_target_response status="201" status_text="OK, resource created" id="tg-1"/>"#,
    );
    let admin = app.token_for("root", Role::Admin);

    let response = app
        .send(request("POST", "/scanner/create_target", Some(&admin), Some(json!({"name": "x", "hosts": ""}))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({"name": "R&D <lab>", "hosts": "10.0.0.1, 10.0.0.2"});
    let response = app.send(request("POST", "/scanner/create_target", Some(&admin), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["target_id"], "tg-1");

    let sent = app.scanner.sent_named("create_target");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("<name>R&amp;D &lt;lab&gt;</name>"));
    assert!(sent[0].contains("<hosts>10.0.0.1,10.0.0.2</hosts>"));
}

#[tokio::test]
async fn test_convert_hosts_reports_each_host() {
    let app = TestApp::new();
    app.scanner
        .reply(
            "get_targets",
            r#"<get_targets_response status="200" status_text="OK"><target id="t0"><name>existing</name></target></get_targets_response>"#,
        )
        .reply("create_target", r#"<create_target_response status="201" status_text="OK, resource created" id="tg-a"/>"#)
        .reply("create_target", r#"<create_target_response status="201" status_text="OK, resource created" id="tg-4"/>"#)
        .reply("create_target", r#"<create_target_response status="400" status_text="Error in host specification"/>"#);
    let admin = app.token_for("root", Role::Admin);

    let body = json!({"hosts": [
        {"hostname": "a", "ip": "10.0.0.1"},
        {"hostname": "noip"},
        {"hostname": "existing", "ip": "10.0.0.3"},
        {"ip": "10.0.0.4"},
        {"hostname": "refused", "ip": "10.0.0.5"}
    ]});
    let response = app
        .send(request("POST", "/scanner/convert_hosts_to_targets", Some(&admin), Some(body)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome = body_json(response).await;

    let created = outcome["created_targets"].as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0], json!({"target_name": "a", "target_id": "tg-a"}));
    assert_eq!(created[1], json!({"target_name": "10.0.0.4", "target_id": "tg-4"}));

    assert_eq!(outcome["skipped"], json!([{"target_name": "existing", "reason": "Target already exists"}]));

    let failed = outcome["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0], json!({"host": "noip", "error": "IP address is required for each host"}));
    assert_eq!(failed[1], json!({"host": "10.0.0.5", "error": "Error in host specification"}));

    assert_eq!(app.scanner.sent_named("create_target").len(), 3);
}

#[tokio::test]
async fn test_create_schedule_sends_icalendar() {
    let app = TestApp::new();
    app.scanner.reply(
        "create_schedule",
        r#"<create_schedule_response status="201" status_text="OK, resource created" id="s-1"/>"#,
    );
    let admin = app.token_for("root", Role::Admin);

    let body = json!({"name": "Nightly", "dtstart": "2024-05-01T03:30:00", "frequency": "weekly", "interval": 2});
    let response = app.send(request("POST", "/scanner/create_schedule", Some(&admin), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["schedule_id"], "s-1");

    let sent = app.scanner.sent_named("create_schedule");
    assert!(sent[0].contains("DTSTART:20240501T033000"));
    assert!(sent[0].contains("RRULE:FREQ=WEEKLY;INTERVAL=2"));
    assert!(sent[0].contains("<timezone>UTC</timezone>"));
}

#[tokio::test]
async fn test_create_schedule_requires_dtstart() {
    let app = TestApp::new();
    let admin = app.token_for("root", Role::Admin);
    let response = app
        .send(request("POST", "/scanner/create_schedule", Some(&admin), Some(json!({"name": "n"}))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.scanner.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_cve_unconfigured() {
    let app = TestApp::new();
    let token = app.token_for("eve", Role::User);
    let body = json!({"results": [{"severity": 9.8, "cve_numbers": ["CVE-2021-44228"]}]});
    let response = app.send(request("POST", "/ai/analyze_cve", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_analyze_cve_answers_each_cve() {
    let llm = Arc::new(FakeLlm::answering("Patch to 2.17.1."));
    let app = TestApp::with_llm(Some(llm.clone()));
    let token = app.token_for("eve", Role::User);

    let body = json!({"results": [
        {"severity": "9.8", "cve_numbers": ["CVE-2021-44228", "CVE-2021-45046"], "description": "log4j"},
        {"severity": 0.0, "cve_numbers": ["CVE-2000-0001"]},
        {"severity": 5.0, "description": "Weak ciphers"}
    ]});
    let response = app.send(request("POST", "/ai/analyze_cve", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let answers = body_json(response).await;
    let answers = answers.as_array().unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0]["cve"], "CVE-2021-44228");
    assert_eq!(answers[0]["answer"], "Patch to 2.17.1.");
    assert_eq!(answers[2]["cve"], "unknown");
    assert_eq!(llm.prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_analyze_cve_provider_failure_keeps_key_private() {
    let gemini = GeminiProvider::new("AIzaSECRET-KEY-123", None, Some("http://127.0.0.1:1/v1beta"));
    let app = TestApp::with_llm(Some(Arc::new(gemini)));
    let token = app.token_for("eve", Role::User);

    let body = json!({"results": [{"severity": 9.8, "cve_numbers": ["CVE-2021-44228"]}]});
    let response = app.send(request("POST", "/ai/analyze_cve", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let answers = body_json(response).await;
    let answer = answers[0]["answer"].as_str().unwrap();
    assert!(answer.starts_with("Error processing CVE: "));
    assert!(!answer.contains("AIzaSECRET-KEY-123"));
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = TestApp::new();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/signin")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.send(req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["type"], "ValidationError");
}
