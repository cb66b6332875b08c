//! Provider clients against a mock HTTP server.
//!
//! The clients are blocking, so each call runs on `spawn_blocking` while the
//! mock server lives on the test runtime.

use gitflow::provider::{
    self, CreatePrOptions, PrState, Provider, ProviderKind, ProviderSettings, ReleaseCreation,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(kind: ProviderKind, server: &MockServer) -> ProviderSettings {
    ProviderSettings {
        kind,
        base_url: server.uri(),
        token: "secret-token".to_string(),
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
    }
}

async fn with_provider<T, F>(settings: ProviderSettings, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(Box<dyn Provider>) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let client = provider::from_settings(settings).unwrap();
        f(client)
    })
    .await
    .unwrap()
}

fn github_pull(number: u64, title: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": title,
        "body": "Details",
        "state": "open",
        "html_url": format!("https://github.com/acme/widgets/pull/{}", number),
        "draft": false,
        "user": { "login": "octocat" },
        "head": { "ref": "feature/login" },
        "base": { "ref": "main" },
        "labels": [{ "name": "enhancement" }],
        "requested_reviewers": []
    })
}

// =============================================================================
// GitHub
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_github_default_branch_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "trunk" })))
        .mount(&server)
        .await;

    let branch = with_provider(settings(ProviderKind::GitHub, &server), |p| {
        p.get_default_branch()
    })
    .await
    .unwrap();
    assert_eq!(branch, "trunk");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_github_auth_failure_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = with_provider(settings(ProviderKind::GitHub, &server), |p| p.validate_auth())
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), gitflow::error::EXIT_PROVIDER);
    assert!(err.to_string().contains("401"));
    assert!(err.to_string().contains("Bad credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_github_create_pr_requests_reviewers_and_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(body_partial_json(json!({
            "title": "Add login",
            "head": "feature/login",
            "base": "main",
            "draft": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(github_pull(7, "Add login")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls/7/requested_reviewers"))
        .and(body_partial_json(json!({ "reviewers": ["alice"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/issues/7/labels"))
        .and(body_partial_json(json!({ "labels": ["ready"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let pr = with_provider(settings(ProviderKind::GitHub, &server), |p| {
        p.create_pr(&CreatePrOptions {
            title: "Add login".to_string(),
            description: "Details".to_string(),
            head_branch: "feature/login".to_string(),
            base_branch: "main".to_string(),
            draft: true,
            reviewers: vec!["alice".to_string()],
            labels: vec!["ready".to_string()],
        })
    })
    .await
    .unwrap();

    assert_eq!(pr.number, 7);
    assert_eq!(pr.author, "octocat");
    assert_eq!(pr.head_branch, "feature/login");
    assert_eq!(pr.reviewers, vec!["alice"]);
    assert_eq!(pr.labels, vec!["ready"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_github_list_prs_passes_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(query_param("state", "closed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([github_pull(1, "First"), github_pull(2, "Second")])),
        )
        .mount(&server)
        .await;

    let prs = with_provider(settings(ProviderKind::GitHub, &server), |p| {
        p.list_prs(PrState::Closed)
    })
    .await
    .unwrap();
    assert_eq!(prs.len(), 2);
    assert_eq!(prs[1].title, "Second");
    assert_eq!(prs[0].labels, vec!["enhancement"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_github_release_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/releases"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed",
            "errors": [{ "resource": "Release", "code": "already_exists", "field": "tag_name" }]
        })))
        .mount(&server)
        .await;

    let outcome = with_provider(settings(ProviderKind::GitHub, &server), |p| {
        p.create_release("v1.0.0", "v1.0.0", "notes")
    })
    .await
    .unwrap();
    assert_eq!(outcome, ReleaseCreation::AlreadyExists);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_github_update_release_looks_up_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/releases/tags/v1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "tag_name": "v1.0.0",
            "name": "old",
            "html_url": "https://github.com/acme/widgets/releases/tag/v1.0.0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/acme/widgets/releases/42"))
        .and(body_partial_json(json!({ "name": "v1.0.0", "body": "new notes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "tag_name": "v1.0.0",
            "name": "v1.0.0",
            "html_url": "https://github.com/acme/widgets/releases/tag/v1.0.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let release = with_provider(settings(ProviderKind::GitHub, &server), |p| {
        p.update_release("v1.0.0", "v1.0.0", "new notes")
    })
    .await
    .unwrap();
    assert_eq!(release.tag, "v1.0.0");
    assert!(release.url.ends_with("/releases/tag/v1.0.0"));
}

// =============================================================================
// GitLab
// =============================================================================

fn gitlab_mr(iid: u64, title: &str) -> serde_json::Value {
    json!({
        "iid": iid,
        "title": title,
        "description": null,
        "state": "opened",
        "web_url": format!("https://gitlab.com/acme/widgets/-/merge_requests/{}", iid),
        "draft": true,
        "author": { "id": 3, "username": "tanuki" },
        "source_branch": "feature/login",
        "target_branch": "main",
        "labels": ["ready"],
        "reviewers": [{ "id": 11, "username": "alice" }]
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gitlab_create_merge_request_resolves_reviewers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 11, "username": "alice" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/acme%2Fwidgets/merge_requests"))
        .and(header("private-token", "secret-token"))
        .and(body_partial_json(json!({
            "source_branch": "feature/login",
            "target_branch": "main",
            "title": "Draft: Add login",
            "labels": "ready,ui",
            "reviewer_ids": [11]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(gitlab_mr(5, "Draft: Add login")))
        .expect(1)
        .mount(&server)
        .await;

    let mr = with_provider(settings(ProviderKind::GitLab, &server), |p| {
        p.create_pr(&CreatePrOptions {
            title: "Add login".to_string(),
            head_branch: "feature/login".to_string(),
            base_branch: "main".to_string(),
            draft: true,
            reviewers: vec!["alice".to_string()],
            labels: vec!["ready".to_string(), "ui".to_string()],
            ..CreatePrOptions::default()
        })
    })
    .await
    .unwrap();

    assert_eq!(mr.number, 5);
    assert!(mr.draft);
    assert_eq!(mr.description, "");
    assert_eq!(mr.author, "tanuki");
    assert_eq!(mr.reviewers, vec!["alice"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gitlab_unknown_reviewer_fails_before_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/acme%2Fwidgets/merge_requests"))
        .respond_with(ResponseTemplate::new(201).set_body_json(gitlab_mr(1, "x")))
        .expect(0)
        .mount(&server)
        .await;

    let err = with_provider(settings(ProviderKind::GitLab, &server), |p| {
        p.create_pr(&CreatePrOptions {
            title: "x".to_string(),
            head_branch: "feature/x".to_string(),
            base_branch: "main".to_string(),
            reviewers: vec!["ghost".to_string()],
            ..CreatePrOptions::default()
        })
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gitlab_list_maps_open_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/acme%2Fwidgets/merge_requests"))
        .and(query_param("state", "opened"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([gitlab_mr(3, "Three")])))
        .mount(&server)
        .await;

    let mrs = with_provider(settings(ProviderKind::GitLab, &server), |p| {
        p.list_prs(PrState::Open)
    })
    .await
    .unwrap();
    assert_eq!(mrs.len(), 1);
    assert_eq!(mrs[0].state, "opened");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gitlab_release_conflict_then_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/acme%2Fwidgets/releases"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Release already exists" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/projects/acme%2Fwidgets/releases/v2.0.0"))
        .and(body_partial_json(json!({ "description": "notes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v2.0.0",
            "name": "v2.0.0",
            "_links": { "self": "https://gitlab.com/acme/widgets/-/releases/v2.0.0" }
        })))
        .mount(&server)
        .await;

    let (created, updated) = with_provider(settings(ProviderKind::GitLab, &server), |p| {
        let created = p.create_release("v2.0.0", "v2.0.0", "notes");
        let updated = p.update_release("v2.0.0", "v2.0.0", "notes");
        (created, updated)
    })
    .await;

    assert_eq!(created.unwrap(), ReleaseCreation::AlreadyExists);
    let release = updated.unwrap();
    assert_eq!(
        release.url,
        "https://gitlab.com/acme/widgets/-/releases/v2.0.0"
    );
}
