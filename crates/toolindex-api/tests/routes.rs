use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use toolindex_api::auth::AppStateInner;
use toolindex_api::routes::router;
use toolindex_db::Database;

fn app(auto_approve: bool) -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        auto_approve,
    });
    router(state)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    register_with_id(app, username).await.1
}

async fn register_with_id(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": username, "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["user_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &Router, token: &str, media: Value) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/community/posts",
        Some(token),
        Some(json!({ "title": "Demo", "content": "Look at this", "media": media })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn comment(app: &Router, token: &str, post_id: &str, parent: Option<&str>) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/community/posts/{post_id}/comments"),
        Some(token),
        Some(json!({ "content": "hi", "parent_id": parent })),
    )
    .await
}

#[tokio::test]
async fn register_and_login() {
    let app = app(true);
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "alice", "password": "another one" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn writes_require_a_token() {
    let app = app(true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/community/posts",
        None,
        Some(json!({ "title": "t", "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/community/posts", Some("not-a-jwt"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/community/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn post_media_accepts_comma_text() {
    let app = app(true);
    let token = register(&app, "alice").await;

    let post_id = create_post(&app, &token, json!("https://a.png, https://youtu.be/dQw4w9WgXcQ")).await;

    let (status, post) = send(&app, Method::GET, &format!("/community/posts/{post_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["post_type"], "discussion");
    assert_eq!(post["author_name"], "alice");

    let media = post["media"].as_array().unwrap();
    assert_eq!(media.len(), 2);
    assert_eq!(media[0]["kind"], "image");
    assert!(media[0].get("video").is_none());
    assert_eq!(media[1]["kind"], "video");
    assert_eq!(media[1]["order"], 1);
    assert_eq!(media[1]["video"]["provider"], "youtube");
    assert_eq!(
        media[1]["video"]["embed_url"],
        "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"
    );
}

#[tokio::test]
async fn post_media_list_and_json_text_match() {
    let app = app(true);
    let token = register(&app, "alice").await;

    let listed = create_post(&app, &token, json!(["https://a.png", "https://b.png"])).await;
    let encoded = create_post(&app, &token, json!(r#"["https://a.png","https://b.png"]"#)).await;

    let (_, a) = send(&app, Method::GET, &format!("/community/posts/{listed}"), None, None).await;
    let (_, b) = send(&app, Method::GET, &format!("/community/posts/{encoded}"), None, None).await;
    assert_eq!(a["media"], b["media"]);
}

#[tokio::test]
async fn liking_twice_restores_the_count() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let other = register(&app, "bob").await;
    let post_id = create_post(&app, &token, Value::Null).await;
    let uri = format!("/community/posts/{post_id}/like");

    let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "liked": true, "count": 1 }));

    let (_, body) = send(&app, Method::POST, &uri, Some(&other), None).await;
    assert_eq!(body, json!({ "liked": true, "count": 2 }));

    let (_, viewed) = send(&app, Method::GET, &format!("/community/posts/{post_id}"), Some(&token), None).await;
    assert_eq!(viewed["viewer_has_liked"], true);
    assert_eq!(viewed["like_count"], 2);

    let (_, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(body, json!({ "liked": false, "count": 1 }));

    let (_, anonymous) = send(&app, Method::GET, &format!("/community/posts/{post_id}"), None, None).await;
    assert_eq!(anonymous["viewer_has_liked"], false);
}

#[tokio::test]
async fn comments_come_back_as_a_tree() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let post_id = create_post(&app, &token, Value::Null).await;

    let (_, root) = comment(&app, &token, &post_id, None).await;
    let root_id = root["id"].as_str().unwrap().to_string();
    let (_, reply) = comment(&app, &token, &post_id, Some(&root_id)).await;
    let reply_id = reply["id"].as_str().unwrap().to_string();
    comment(&app, &token, &post_id, Some(&reply_id)).await;
    comment(&app, &token, &post_id, None).await;

    let (status, tree) = send(&app, Method::GET, &format!("/community/posts/{post_id}/comments"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["id"], root_id.as_str());
    assert_eq!(roots[0]["replies"][0]["id"], reply_id.as_str());
    assert_eq!(roots[0]["replies"][0]["replies"].as_array().unwrap().len(), 1);
    assert_eq!(roots[1]["replies"], json!([]));

    let (_, post) = send(&app, Method::GET, &format!("/community/posts/{post_id}"), None, None).await;
    assert_eq!(post["comment_count"], 4);
}

#[tokio::test]
async fn deleted_parent_drops_its_replies() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let post_id = create_post(&app, &token, Value::Null).await;

    let (_, root) = comment(&app, &token, &post_id, None).await;
    let root_id = root["id"].as_str().unwrap().to_string();
    comment(&app, &token, &post_id, Some(&root_id)).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/community/comments/{root_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tree) = send(&app, Method::GET, &format!("/community/posts/{post_id}/comments"), None, None).await;
    assert_eq!(tree, json!([]));
}

#[tokio::test]
async fn replies_are_capped_and_stay_on_their_post() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let post_id = create_post(&app, &token, Value::Null).await;
    let other_post = create_post(&app, &token, Value::Null).await;

    let (_, mut parent) = comment(&app, &token, &post_id, None).await;
    for _ in 0..3 {
        let (status, child) = comment(&app, &token, &post_id, parent["id"].as_str()).await;
        assert_eq!(status, StatusCode::CREATED);
        parent = child;
    }

    let (status, _) = comment(&app, &token, &post_id, parent["id"].as_str()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = comment(&app, &token, &other_post, parent["id"].as_str()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_author_deletes_a_post() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let other = register(&app, "bob").await;
    let post_id = create_post(&app, &token, Value::Null).await;
    let uri = format!("/community/posts/{post_id}");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tools_submit_favorite_and_review() {
    let app = app(true);
    let token = register(&app, "alice").await;
    let submission = json!({
        "name": "Ripgrep",
        "description": "Fast search",
        "url": "https://github.com/BurntSushi/ripgrep",
        "category": "cli",
        "screenshots": ["https://shots/1.png", "https://vimeo.com/76979871"],
        "tags": "search, rust, Search",
    });

    let (status, tool) = send(&app, Method::POST, "/tools", Some(&token), Some(submission.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tool["tags"], json!(["rust", "search"]));
    assert_eq!(tool["screenshots"][1]["video"]["provider"], "vimeo");
    let tool_id = tool["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, "/tools", Some(&token), Some(submission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Ripgrep"));

    let (_, listed) = send(&app, Method::GET, "/tools?category=cli", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let favorite = format!("/tools/{tool_id}/favorite");
    let (_, body) = send(&app, Method::POST, &favorite, Some(&token), None).await;
    assert_eq!(body, json!({ "liked": true, "count": 1 }));
    let (_, detail) = send(&app, Method::GET, &format!("/tools/{tool_id}"), Some(&token), None).await;
    assert_eq!(detail["viewer_has_favorited"], true);
    assert_eq!(detail["favorite_count"], 1);

    let reviews = format!("/tools/{tool_id}/reviews");
    let (status, _) = send(&app, Method::POST, &reviews, Some(&token), Some(json!({ "content": "ok", "rating": 9 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, review) = send(&app, Method::POST, &reviews, Some(&token), Some(json!({ "content": "Great", "rating": 4 }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let helpful = format!("/reviews/{}/helpful", review["id"].as_str().unwrap());
    let (_, body) = send(&app, Method::POST, &helpful, Some(&token), None).await;
    assert_eq!(body, json!({ "liked": true, "count": 1 }));

    let (_, list) = send(&app, Method::GET, &reviews, Some(&token), None).await;
    assert_eq!(list["reviews"][0]["viewer_found_helpful"], true);
    let (_, detail) = send(&app, Method::GET, &format!("/tools/{tool_id}"), None, None).await;
    assert_eq!(detail["rating_count"], 1);
}

#[tokio::test]
async fn invalid_tool_url_is_rejected() {
    let app = app(true);
    let token = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/tools",
        Some(&token),
        Some(json!({ "name": "x", "description": "y", "url": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unapproved_tools_are_hidden_from_others() {
    let app = app(false);
    let token = register(&app, "alice").await;
    let other = register(&app, "bob").await;

    let (status, tool) = send(
        &app,
        Method::POST,
        "/tools",
        Some(&token),
        Some(json!({ "name": "x", "description": "y", "url": "https://x.dev" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/tools/{}", tool["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, Method::GET, "/tools", None, None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn hidden_tools_reject_favorites_and_reviews() {
    let app = app(false);
    let token = register(&app, "alice").await;
    let other = register(&app, "bob").await;

    let (_, tool) = send(
        &app,
        Method::POST,
        "/tools",
        Some(&token),
        Some(json!({ "name": "x", "description": "y", "url": "https://x.dev" })),
    )
    .await;
    let tool_id = tool["id"].as_str().unwrap().to_string();
    let favorite = format!("/tools/{tool_id}/favorite");
    let reviews = format!("/tools/{tool_id}/reviews");
    let review = json!({ "content": "Nice", "rating": 5 });

    let (status, _) = send(&app, Method::POST, &favorite, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &reviews, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &reviews, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, &reviews, Some(&other), Some(review.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, &format!("/tools/{tool_id}/view"), Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, &favorite, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, posted) = send(&app, Method::POST, &reviews, Some(&token), Some(review)).await;
    assert_eq!(status, StatusCode::CREATED);

    let helpful = format!("/reviews/{}/helpful", posted["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::POST, &helpful, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, &helpful, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn usernames_are_counted_in_characters() {
    let app = app(true);

    // Three characters, nine bytes.
    register(&app, "日本語").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "éé", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "ü".repeat(32), "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn tool_views_and_clicks_are_counted() {
    let app = app(true);
    let token = register(&app, "alice").await;

    let (_, tool) = send(
        &app,
        Method::POST,
        "/tools",
        Some(&token),
        Some(json!({ "name": "x", "description": "y", "url": "https://x.dev" })),
    )
    .await;
    let tool_id = tool["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, &format!("/tools/{tool_id}/view"), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    send(&app, Method::POST, &format!("/tools/{tool_id}/view"), Some(&token), None).await;
    send(&app, Method::POST, &format!("/tools/{tool_id}/click"), None, None).await;

    let (_, detail) = send(&app, Method::GET, &format!("/tools/{tool_id}"), None, None).await;
    assert_eq!(detail["view_count"], 2);
    assert_eq!(detail["click_count"], 1);

    let missing = format!("/tools/{}/click", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tools_filter_by_pricing() {
    let app = app(true);
    let token = register(&app, "alice").await;

    for (name, pricing) in [("a", "free"), ("b", "paid"), ("c", "free")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/tools",
            Some(&token),
            Some(json!({
                "name": name,
                "description": "d",
                "url": format!("https://{name}.dev"),
                "pricing": pricing,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, free) = send(&app, Method::GET, "/tools?pricing=free", None, None).await;
    assert_eq!(free.as_array().unwrap().len(), 2);
    let (_, paid) = send(&app, Method::GET, "/tools?pricing=paid", None, None).await;
    assert_eq!(paid[0]["name"], "b");
    let (_, all) = send(&app, Method::GET, "/tools?pricing=", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn profiles_are_public_and_self_edited() {
    let app = app(true);
    let (alice_id, token) = register_with_id(&app, "alice").await;
    let other = register(&app, "bob").await;
    let uri = format!("/users/{alice_id}");

    let (status, profile) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["display_name"], Value::Null);
    assert_eq!(profile["show_as_author"], true);

    let update = json!({
        "display_name": "  Ada  ",
        "bio": "Builds tools",
        "website_url": "https://ada.dev",
        "github_handle": "@ada",
    });
    let (status, _) = send(&app, Method::PUT, &uri, Some(&other), Some(update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::PUT, &uri, None, Some(update.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "website_url": "ada dot dev" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(&app, Method::PUT, &uri, Some(&token), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["display_name"], "Ada");
    assert_eq!(updated["github_handle"], "ada");

    let post_id = create_post(&app, &token, Value::Null).await;
    let (_, post) = send(&app, Method::GET, &format!("/community/posts/{post_id}"), None, None).await;
    assert_eq!(post["author_name"], "Ada");

    let (_, profile) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(profile["post_count"], 1);
    assert_eq!(profile["recent_posts"][0]["id"], post_id.as_str());

    let missing = format!("/users/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::GET, &missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_posts_hide_the_author() {
    let app = app(true);
    let (alice_id, token) = register_with_id(&app, "alice").await;
    let other = register(&app, "bob").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{alice_id}"),
        Some(&token),
        Some(json!({ "show_as_author": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No explicit flag, so the profile preference applies.
    let post_id = create_post(&app, &token, Value::Null).await;
    let uri = format!("/community/posts/{post_id}");

    let (_, seen_by_other) = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(seen_by_other["author_name"], Value::Null);
    assert_eq!(seen_by_other["author_id"], Value::Null);

    let (_, seen_by_author) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(seen_by_author["author_id"], alice_id.as_str());

    let (_, comment) = send(
        &app,
        Method::POST,
        &format!("{uri}/comments"),
        Some(&token),
        Some(json!({ "content": "hi", "show_author": true })),
    )
    .await;
    assert_eq!(comment["author_name"], "alice");

    let (_, profile) = send(&app, Method::GET, &format!("/users/{alice_id}"), None, None).await;
    assert_eq!(profile["post_count"], 0);
    assert_eq!(profile["recent_posts"], json!([]));
}
