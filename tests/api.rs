mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

use botforge::store::Store;

// --- Auth flow ---

#[tokio::test]
async fn test_login_creates_identity_and_session() {
    let app = TestApp::new();

    let (token, user) = app.login(42, "octocat").await;

    assert!(token.starts_with("botforge_"));
    assert_eq!(user["id"], "42");
    assert_eq!(user["login"], "octocat");
    // The provider token must never be serialized back to the client.
    assert!(user.get("sealed_token").is_none());
    assert!(user.get("github_token").is_none());

    let (status, body) = app.request("GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["login"], "octocat");
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn test_login_code_is_single_use() {
    let app = TestApp::new();
    app.host.register_code("one-shot", 42, "octocat");

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/github",
            None,
            Some(json!({ "code": "one-shot" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/auth/github",
            None,
            Some(json!({ "code": "one-shot" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("GitHub rejected"));
}

#[tokio::test]
async fn test_login_with_bad_code_writes_no_identity() {
    let app = TestApp::new();

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/github",
            None,
            Some(json!({ "code": "never-registered" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.get_identity("42").unwrap().is_none());
}

#[tokio::test]
async fn test_login_with_empty_code_is_rejected() {
    let app = TestApp::new();

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/auth/github",
            None,
            Some(json!({ "code": "  " })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_relogin_overwrites_profile_but_keeps_identity() {
    let app = TestApp::new();

    let (_, user) = app.login(42, "octocat").await;
    assert_eq!(user["login"], "octocat");

    // Same GitHub account, renamed.
    let (_, user) = app.login(42, "octocat-renamed").await;
    assert_eq!(user["id"], "42");
    assert_eq!(user["login"], "octocat-renamed");
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new();

    let (status, _) = app.request("GET", "/api/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("GET", "/api/v1/me", Some("botforge_bogus"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = TestApp::new();
    let (token, _) = app.login(42, "octocat").await;

    let (status, _) = app
        .request("POST", "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.request("GET", "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- Template catalog ---

#[tokio::test]
async fn test_template_crud_requires_admin() {
    let app = TestApp::new();
    let (user_token, _) = app.login(42, "octocat").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/admin/templates",
            Some(&user_token),
            Some(json!({ "name": "starter", "url": "https://github.test/acme/starter" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("GET", "/api/v1/admin/templates", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_templates() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/admin/templates",
            Some(&admin_token),
            Some(json!({
                "name": "starter",
                "url": "https://github.test/acme/starter",
                "description": "Starter chatbot"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let template_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["active"], true);

    // Deactivate it.
    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/v1/admin/templates/{template_id}"),
            Some(&admin_token),
            Some(json!({ "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    // Unknown ids are 404.
    let (status, _) = app
        .request(
            "GET",
            "/api/v1/admin/templates/does-not-exist",
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete works while nothing references the template.
    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/v1/admin/templates/{template_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_template_validation() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/admin/templates",
            Some(&admin_token),
            Some(json!({ "name": "  ", "url": "https://github.test/acme/starter" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/admin/templates",
            Some(&admin_token),
            Some(json!({ "name": "starter", "url": "not-a-url" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_see_only_active_templates() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;
    let (user_token, _) = app.login(42, "octocat").await;

    for (name, active) in [("live", true), ("retired", false)] {
        let (status, _) = app
            .request(
                "POST",
                "/api/v1/admin/templates",
                Some(&admin_token),
                Some(json!({
                    "name": name,
                    "url": format!("https://github.test/acme/{name}"),
                    "active": active
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .request("GET", "/api/v1/templates", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let templates = body["data"].as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["name"], "live");
}

// --- Provisioning ---

async fn seed_template(app: &TestApp, admin_token: &str, active: bool) -> String {
    let (status, body) = app
        .request(
            "POST",
            "/api/v1/admin/templates",
            Some(admin_token),
            Some(json!({
                "name": "starter",
                "url": "https://github.test/acme/starter",
                "active": active
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_provision_chatbot_end_to_end() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;
    let (user_token, _) = app.login(42, "octocat").await;
    let template_id = seed_template(&app, &admin_token, true).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&user_token),
            Some(json!({ "template_id": template_id, "name": "Raja Ampat" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "provision failed: {body}");

    let chatbot = &body["data"];
    assert_eq!(chatbot["repo_name"], "raja-ampat");
    assert_eq!(chatbot["repo_url"], "https://github.test/octocat/raja-ampat");
    assert_eq!(chatbot["display_name"], "Raja Ampat");

    // Remote and local agree.
    assert_eq!(app.host.remote_repos(), vec!["octocat/raja-ampat"]);

    let (status, body) = app
        .request("GET", "/api/v1/chatbots", Some(&user_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // The empty default config exists immediately.
    let chatbot_id = chatbot["id"].as_str().unwrap();
    let (status, body) = app
        .request(
            "GET",
            &format!("/api/v1/chatbots/{chatbot_id}/config"),
            Some(&user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["title"].is_null());
}

#[tokio::test]
async fn test_provision_rejects_bad_template_references() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;
    let (user_token, _) = app.login(42, "octocat").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&user_token),
            Some(json!({ "template_id": "missing", "name": "Bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let inactive_id = seed_template(&app, &admin_token, false).await;
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&user_token),
            Some(json!({ "template_id": inactive_id, "name": "Bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing reached the fake host.
    assert!(app.host.remote_repos().is_empty());
}

#[tokio::test]
async fn test_provision_name_conflict_leaves_no_local_record() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;
    let (user_token, _) = app.login(42, "octocat").await;
    let template_id = seed_template(&app, &admin_token, true).await;

    let (status, _) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&user_token),
            Some(json!({ "template_id": template_id, "name": "My Bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same derived name again: conflict, and still exactly one chatbot.
    let (status, _) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&user_token),
            Some(json!({ "template_id": template_id, "name": "my   bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .request("GET", "/api/v1/chatbots", Some(&user_token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chatbots_are_scoped_to_their_owner() {
    let app = TestApp::new();
    let admin_token = app.login_admin(1, "boss").await;
    let (alice_token, _) = app.login(42, "alice").await;
    let (bob_token, _) = app.login(43, "bob").await;
    let template_id = seed_template(&app, &admin_token, true).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(&alice_token),
            Some(json!({ "template_id": template_id, "name": "Alice Bot" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let chatbot_id = body["data"]["id"].as_str().unwrap().to_string();

    // Bob sees an empty list and cannot address Alice's chatbot.
    let (_, body) = app
        .request("GET", "/api/v1/chatbots", Some(&bob_token), None)
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/v1/chatbots/{chatbot_id}"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "GET",
            &format!("/api/v1/chatbots/{chatbot_id}/config"),
            Some(&bob_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Chatbot content ---

async fn provisioned_chatbot(app: &TestApp, user_token: &str) -> String {
    let admin_token = app.login_admin(1, "boss").await;
    let template_id = seed_template(app, &admin_token, true).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/chatbots",
            Some(user_token),
            Some(json!({ "template_id": template_id, "name": "Raja Ampat" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_config_update_round_trip() {
    let app = TestApp::new();
    let (user_token, _) = app.login(42, "octocat").await;
    let chatbot_id = provisioned_chatbot(&app, &user_token).await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/v1/chatbots/{chatbot_id}/config"),
            Some(&user_token),
            Some(json!({ "title": "Visit Raja Ampat", "subtitle": "Ask me anything" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Visit Raja Ampat");

    // PUT with a missing field clears it.
    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/v1/chatbots/{chatbot_id}/config"),
            Some(&user_token),
            Some(json!({ "title": "Visit Raja Ampat" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["subtitle"].is_null());
}

#[tokio::test]
async fn test_news_crud() {
    let app = TestApp::new();
    let (user_token, _) = app.login(42, "octocat").await;
    let chatbot_id = provisioned_chatbot(&app, &user_token).await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/v1/chatbots/{chatbot_id}/news"),
            Some(&user_token),
            Some(json!({
                "title": "Diving season opens",
                "url": "https://news.test/diving",
                "full_text": "The diving season opens next week.",
                "published_at": "2026-08-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create news failed: {body}");
    let news_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/v1/chatbots/{chatbot_id}/news/{news_id}"),
            Some(&user_token),
            Some(json!({ "title": "Diving season opens early" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Diving season opens early");
    assert_eq!(body["data"]["url"], "https://news.test/diving");

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/v1/chatbots/{chatbot_id}/news"),
            Some(&user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/v1/chatbots/{chatbot_id}/news/{news_id}"),
            Some(&user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .request(
            "GET",
            &format!("/api/v1/chatbots/{chatbot_id}/news"),
            Some(&user_token),
            None,
        )
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_questions_crud() {
    let app = TestApp::new();
    let (user_token, _) = app.login(42, "octocat").await;
    let chatbot_id = provisioned_chatbot(&app, &user_token).await;

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/v1/chatbots/{chatbot_id}/questions"),
            Some(&user_token),
            Some(json!({ "question": "What is the best season to visit?" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let question_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/api/v1/chatbots/{chatbot_id}/questions/{question_id}"),
            Some(&user_token),
            Some(json!({ "question": "When is the best season to visit?" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["question"], "When is the best season to visit?");

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/v1/chatbots/{chatbot_id}/questions"),
            Some(&user_token),
            Some(json!({ "question": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/v1/chatbots/{chatbot_id}/questions/{question_id}"),
            Some(&user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
