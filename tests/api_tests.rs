// tests/api_tests.rs

mod common;

use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn ping_answers() {
    let app = spawn_app().await;

    let (status, body) = app.get_json("/api/ping", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["pong"], true);
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let (status, _) = app
        .get_json("/random_path_that_does_not_exist", None)
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn register_login_and_profile_flow() {
    let app = spawn_app().await;
    let unique_name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let email = format!("{}@example.com", unique_name);

    // 1. Register
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "nome": "Test User",
            "username": unique_name,
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    // 2. Registering the same email again conflicts
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "nome": "Copy",
            "username": "someone_else",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 3. Wrong password
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "senha": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // 4. Login
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "senha": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["user"]["username"], unique_name.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    // 5. Profile
    let (status, body) = app.get_json("/api/user/profile", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["email"], email.as_str());

    // 6. Update
    let response = app
        .client
        .put(app.url("/api/user/update"))
        .bearer_auth(&token)
        .json(&json!({ "bio": "<script>x</script>making beats" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["bio"], "making beats");
    assert_eq!(body["user"]["nome"], "Test User");
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "nome": "Short",
            "username": "yo",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn parental_consent_verifies_the_account() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "nome": "Kid",
            "username": "kid_user",
            "email": "kid@example.com",
            "password": "password123",
            "parental_email": "parent@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = 'kid_user'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let (status, _) = app
        .get_json(&format!("/api/auth/consent?user_id={}", id), None)
        .await;
    assert_eq!(status, 200);

    let verified = sqlx::query_scalar::<_, bool>("SELECT is_verified FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(verified);

    let (status, _) = app.get_json("/api/auth/consent?user_id=999", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn post_lifecycle() {
    let app = spawn_app().await;
    let author = app.insert_user("author").await;
    let reader = app.insert_user("reader").await;
    let token = app.token_for(author);

    // Create a social post and a listing
    let response = app
        .client
        .post(app.url("/api/posts"))
        .bearer_auth(&token)
        .json(&json!({ "tipo": "social", "conteudo": "new track out" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let social_id = response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/posts"))
        .bearer_auth(&token)
        .json(&json!({
            "tipo": "product",
            "titulo": "Lo-fi kit",
            "preco": 19.9,
            "file_path": "/files/lofi.zip"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Moderation
    let response = app
        .client
        .post(app.url("/api/posts"))
        .bearer_auth(&token)
        .json(&json!({ "tipo": "social", "conteudo": "isso é OUTROEXEMPLO" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Feed
    let (status, feed) = app.get_json("/api/posts", None).await;
    assert_eq!(status, 200);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["tipo"], "product");
    assert_eq!(feed[0]["titulo"], "Lo-fi kit");
    assert_eq!(feed[1]["conteudo"], "new track out");
    assert_eq!(feed[1]["author"]["username"], "author");

    let (_, products) = app.get_json("/api/products", None).await;
    assert_eq!(products.as_array().unwrap().len(), 1);

    let (status, _) = app
        .get_json(&format!("/api/products/{}", social_id), None)
        .await;
    assert_eq!(status, 404);

    // Comments
    let response = app
        .client
        .post(app.url(&format!("/api/posts/{}/comments", social_id)))
        .bearer_auth(app.token_for(reader))
        .json(&json!({ "content": "great" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let (_, comments) = app
        .get_json(&format!("/api/posts/{}/comments", social_id), None)
        .await;
    assert_eq!(comments[0]["username"], "reader");

    let (_, post) = app
        .get_json(&format!("/api/posts/{}", social_id), None)
        .await;
    assert_eq!(post["comments"], 1);

    // Report
    let response = app
        .client
        .post(app.url(&format!("/api/posts/{}/report", social_id)))
        .bearer_auth(app.token_for(reader))
        .json(&json!({ "reason": "spam" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Only the author can delete
    let delete = |token: String| {
        app.client
            .delete(app.url(&format!("/api/posts/{}", social_id)))
            .bearer_auth(token)
            .send()
    };
    assert_eq!(delete(app.token_for(reader)).await.unwrap().status().as_u16(), 403);
    assert_eq!(delete(token.clone()).await.unwrap().status().as_u16(), 204);

    let (status, _) = app
        .get_json(&format!("/api/posts/{}", social_id), None)
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn protected_routes_reject_missing_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/posts"))
        .json(&json!({ "tipo": "social", "conteudo": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let (status, _) = app.get_json("/api/user/profile", None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn search_matches_titles_usernames_and_posts() {
    let app = spawn_app().await;
    let author = app.insert_user("beatmaker").await;
    app.insert_product(author, "Beat bundle", 5.0).await;
    app.insert_social(author, "new BEAT tomorrow").await;
    app.insert_social(author, "unrelated").await;

    let (status, body) = app.get_json("/api/search?q=beat", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["produtos"].as_array().unwrap().len(), 1);
    assert_eq!(body["usuarios"][0]["username"], "beatmaker");
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);

    let (_, empty) = app.get_json("/api/search?q=", None).await;
    assert_eq!(empty["produtos"], json!([]));
}
