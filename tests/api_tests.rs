// tests/api_tests.rs

use std::sync::Arc;

use dir_khir::{config::Config, routes, state::AppState, store::SqliteStore};
use serde_json::{Value, json};

/// Spawns the app on a random port backed by a fresh in-memory database.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let store = SqliteStore::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    store.migrate().await.expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        public_base_url: "https://dirkhir.test".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let state = AppState {
        store: Arc::new(store),
        config,
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_username() -> String {
    // Usernames are limited to 10 alphanumeric characters.
    format!("u{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn registration(username: &str) -> Value {
    json!({
        "name": "Test Member",
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "Str0ng!pass",
        "confirmPassword": "Str0ng!pass",
        "gender": true
    })
}

/// Registers a fresh user and logs in. Returns (token, user id).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let username = unique_username();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&registration(&username))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": "Str0ng!pass" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    let token = login["token"].as_str().expect("Token not found").to_string();
    let user_id = login["user"]["id"].as_str().expect("User id not found").to_string();
    (token, user_id)
}

async fn create_need(client: &reqwest::Client, address: &str, token: &str, body: Value) -> String {
    let response = client
        .post(format!("{}/api/needs", address))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Create need failed");
    assert_eq!(response.status().as_u16(), 201);

    let created: Value = response.json().await.unwrap();
    assert_eq!(created["success"], true);
    created["need"]["id"].as_str().unwrap().to_string()
}

fn food_in_rabat() -> Value {
    json!({
        "title": "Food basket for a family",
        "description": "A family of five needs groceries for the coming week.",
        "category": "food",
        "city": "Rabat",
        "phoneWhatsApp": "+212 600-000000"
    })
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_username();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&registration(&username))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["username"], username.as_str());
    assert_eq!(user["role"], "member");
    assert!(user.get("password").is_none());

    let duplicate = client
        .post(format!("{}/api/auth/register", address))
        .json(&registration(&username))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let mut weak = registration(&unique_username());
    weak["password"] = json!("weakpass");
    weak["confirmPassword"] = json!("weakpass");
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&weak)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_accepts_email_and_rejects_bad_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_username();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&registration(&username))
        .send()
        .await
        .unwrap();

    let by_email = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": format!("{username}@EXAMPLE.com"), "password": "Str0ng!pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(by_email.status().as_u16(), 200);
    let token = by_email.json::<Value>().await.unwrap()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["username"], username.as_str());

    let wrong = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": "Wr0ng!pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let anonymous = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn anonymous_mutations_get_tagged_error() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/needs", address))
        .json(&food_in_rabat())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "unauthenticated");

    let response = client
        .post(format!("{}/api/needs/some-id/volunteer", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn create_need_rejects_invalid_input() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    let mut body = food_in_rabat();
    body["description"] = json!("Too short");
    body["city"] = json!("Atlantis");

    let response = client
        .post(format!("{}/api/needs", address))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn volunteer_unvolunteer_resolve_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (owner_token, owner_id) = register_and_login(&client, &address).await;
    let (helper_token, helper_id) = register_and_login(&client, &address).await;

    let need_id = create_need(&client, &address, &owner_token, food_in_rabat()).await;

    // Owner cannot volunteer for their own need
    let response = client
        .post(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "own_need");

    // Helper volunteers
    let response = client
        .post(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["volunteerCount"], 1);

    // Second attempt conflicts
    let response = client
        .post(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "already_volunteered");

    // Detail view as the helper
    let detail: Value = client
        .get(format!("{}/api/needs/{}", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["volunteerCount"], 1);
    assert_eq!(detail["author"]["id"], owner_id.as_str());
    assert_eq!(detail["volunteers"][0]["userId"], helper_id.as_str());
    assert_eq!(detail["hasVolunteered"], true);
    assert_eq!(detail["isOwner"], false);
    assert_eq!(detail["phoneWhatsApp"], "+212 600-000000");
    assert_eq!(
        detail["shareUrl"],
        format!("https://dirkhir.test/needs/{}", need_id).as_str()
    );

    // Helper withdraws
    let body: Value = client
        .delete(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["volunteerCount"], 0);

    // Helper cannot resolve, owner can
    let response = client
        .post(format!("{}/api/needs/{}/resolve", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .post(format!("{}/api/needs/{}/resolve", address, need_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Resolved needs take no new volunteers
    let response = client
        .post(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "need_resolved");

    // Hidden from the default listing, present among resolved needs
    let open: Vec<Value> = client
        .get(format!("{}/api/needs", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(open.iter().all(|n| n["id"] != need_id.as_str()));

    let resolved: Vec<Value> = client
        .get(format!("{}/api/needs?resolved=true", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(resolved.iter().any(|n| n["id"] == need_id.as_str()));
}

#[tokio::test]
async fn owner_deletes_need() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (owner_token, _) = register_and_login(&client, &address).await;
    let (other_token, _) = register_and_login(&client, &address).await;

    let need_id = create_need(&client, &address, &owner_token, food_in_rabat()).await;

    let response = client
        .delete(format!("{}/api/needs/{}", address, need_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .delete(format!("{}/api/needs/{}", address, need_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/api/needs/{}", address, need_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "need_not_found");
}

#[tokio::test]
async fn listing_filters_by_city_and_category() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    let rabat_food = create_need(&client, &address, &token, food_in_rabat()).await;
    let mut fez = food_in_rabat();
    fez["city"] = json!("fez");
    fez["category"] = json!("health");
    let fez_health = create_need(&client, &address, &token, fez).await;

    let listed: Vec<Value> = client
        .get(format!("{}/api/needs?city=RABAT&category=food", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], rabat_food.as_str());

    let listed: Vec<Value> = client
        .get(format!("{}/api/needs?category=health", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], fez_health.as_str());
    assert_eq!(listed[0]["city"], "Fez");

    let response = client
        .get(format!("{}/api/needs?category=astrology", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn dashboard_requires_login_and_counts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (owner_token, _) = register_and_login(&client, &address).await;
    let (helper_token, _) = register_and_login(&client, &address).await;

    let response = client
        .get(format!("{}/api/me/stats", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let need_id = create_need(&client, &address, &owner_token, food_in_rabat()).await;
    client
        .post(format!("{}/api/needs/{}/volunteer", address, need_id))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap();

    let owner_stats: Value = client
        .get(format!("{}/api/me/stats", address))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(owner_stats["activeNeeds"], 1);
    assert_eq!(owner_stats["activeCommitments"], 0);

    let commitments: Vec<Value> = client
        .get(format!("{}/api/me/volunteering", address))
        .bearer_auth(&helper_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(commitments.len(), 1);
    assert_eq!(commitments[0]["id"], need_id.as_str());

    let mine: Vec<Value> = client
        .get(format!("{}/api/me/needs", address))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn meta_lists_categories_and_cities() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let meta: Value = client
        .get(format!("{}/api/meta", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(meta["categories"].as_array().unwrap().len(), 6);
    assert_eq!(meta["categories"][4]["value"], "food");
    assert!(meta["cities"].as_array().unwrap().iter().any(|c| c == "Rabat"));
}
