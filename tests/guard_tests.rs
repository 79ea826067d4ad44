// tests/guard_tests.rs

mod common;

use common::{spawn_app, spawn_app_on_file};

fn count(statuses: &[u16], status: u16) -> usize {
    statuses.iter().filter(|s| **s == status).count()
}

#[tokio::test]
async fn strict_like_rejects_the_second_like() {
    let app = spawn_app().await;
    let author = app.insert_user("author").await;
    let fan = app.insert_user("fan").await;
    let post = app.insert_social(author, "first drop").await;
    let token = app.token_for(fan);

    let first = app
        .post_authed(&format!("/api/posts/{}/like/strict", post), &token)
        .await;
    assert_eq!(first.status().as_u16(), 200);
    let body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(body["likes"], 1);

    let second = app
        .post_authed(&format!("/api/posts/{}/like/strict", post), &token)
        .await;
    assert_eq!(second.status().as_u16(), 400);
    let body: serde_json::Value = second.json().await.unwrap();
    assert!(body["error"].is_string());

    let (_, post_json) = app.get_json(&format!("/api/posts/{}", post), None).await;
    assert_eq!(post_json["likes"], 1);
}

#[tokio::test]
async fn concurrent_strict_likes_store_a_single_like() {
    let app = spawn_app_on_file().await;
    let author = app.insert_user("author").await;
    let fan = app.insert_user("fan").await;
    let post = app.insert_social(author, "race me").await;
    let token = app.token_for(fan);

    for _ in 0..5 {
        sqlx::query("DELETE FROM post_likes")
            .execute(&app.pool)
            .await
            .unwrap();

        let statuses = app
            .post_concurrently(&format!("/api/posts/{}/like/strict", post), &token, 5)
            .await;
        assert_eq!(count(&statuses, 200), 1, "statuses: {:?}", statuses);
        assert_eq!(count(&statuses, 400), 4, "statuses: {:?}", statuses);

        let stored =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
                .bind(post)
                .fetch_one(&app.pool)
                .await
                .unwrap();
        assert_eq!(stored, 1);
    }
}

#[tokio::test]
async fn concurrent_follows_store_a_single_edge() {
    let app = spawn_app_on_file().await;
    let alice = app.insert_user("alice").await;
    let bob = app.insert_user("bob").await;

    let statuses = app
        .post_concurrently(&format!("/api/users/{}/follow", bob), &app.token_for(alice), 5)
        .await;
    assert_eq!(count(&statuses, 200), 1, "statuses: {:?}", statuses);
    assert_eq!(count(&statuses, 400), 4, "statuses: {:?}", statuses);

    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn concurrent_purchases_store_a_single_purchase() {
    let app = spawn_app_on_file().await;
    let seller = app.insert_user("seller").await;
    let buyer = app.insert_user("buyer").await;
    let product = app.insert_product(seller, "Stems", 7.0).await;

    let statuses = app
        .post_concurrently(
            &format!("/api/products/{}/purchase", product),
            &app.token_for(buyer),
            5,
        )
        .await;
    assert_eq!(count(&statuses, 201), 1, "statuses: {:?}", statuses);
    assert_eq!(count(&statuses, 400), 4, "statuses: {:?}", statuses);

    let (purchases, downloads) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT (SELECT COUNT(*) FROM purchases), (SELECT downloads FROM posts WHERE id = ?)",
    )
    .bind(product)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(purchases, 1);
    assert_eq!(downloads, 0);
}

#[tokio::test]
async fn toggle_like_flips_between_liked_and_unliked() {
    let app = spawn_app().await;
    let author = app.insert_user("author").await;
    let fan = app.insert_user("fan").await;
    let post = app.insert_social(author, "toggle").await;
    let token = app.token_for(fan);
    let path = format!("/api/posts/{}/like", post);

    let body: serde_json::Value = app.post_authed(&path, &token).await.json().await.unwrap();
    assert_eq!(body["liked"], true);
    assert_eq!(body["likes"], 1);

    let body: serde_json::Value = app.post_authed(&path, &token).await.json().await.unwrap();
    assert_eq!(body["liked"], false);
    assert_eq!(body["likes"], 0);
}

#[tokio::test]
async fn liking_a_missing_post_is_not_found() {
    let app = spawn_app().await;
    let fan = app.insert_user("fan").await;
    let token = app.token_for(fan);

    let response = app.post_authed("/api/posts/999/like/strict", &token).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unlike_without_a_like_is_not_found() {
    let app = spawn_app().await;
    let author = app.insert_user("author").await;
    let post = app.insert_social(author, "lonely").await;
    let token = app.token_for(author);

    let response = app
        .client
        .delete(app.url(&format!("/api/posts/{}/like", post)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn follow_rules() {
    let app = spawn_app().await;
    let alice = app.insert_user("alice").await;
    let bob = app.insert_user("bob").await;
    let token = app.token_for(alice);
    let follow_bob = format!("/api/users/{}/follow", bob);

    // Self-follow
    let response = app
        .post_authed(&format!("/api/users/{}/follow", alice), &token)
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown target
    let response = app.post_authed("/api/users/999/follow", &token).await;
    assert_eq!(response.status().as_u16(), 404);

    // First follow succeeds, the second is rejected
    assert_eq!(app.post_authed(&follow_bob, &token).await.status().as_u16(), 200);
    assert_eq!(app.post_authed(&follow_bob, &token).await.status().as_u16(), 400);

    let (status, followers) = app
        .get_json(&format!("/api/users/{}/followers", bob), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(followers.as_array().unwrap().len(), 1);
    assert_eq!(followers[0]["username"], "alice");

    let (_, following) = app
        .get_json(&format!("/api/users/{}/following", alice), None)
        .await;
    assert_eq!(following[0]["username"], "bob");

    // Unfollow once, then again with no edge left
    for expected in [200, 400] {
        let response = app
            .client
            .delete(app.url(&follow_bob))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }
}

#[tokio::test]
async fn purchase_rules() {
    let app = spawn_app().await;
    let seller = app.insert_user("seller").await;
    let buyer = app.insert_user("buyer").await;
    let product = app.insert_product(seller, "Sample pack", 12.5).await;
    let social = app.insert_social(seller, "not for sale").await;
    let token = app.token_for(buyer);
    let path = format!("/api/products/{}/purchase", product);

    let first = app.post_authed(&path, &token).await;
    assert_eq!(first.status().as_u16(), 201);
    let body: serde_json::Value = first.json().await.unwrap();
    assert!(body["purchase_id"].is_i64());

    assert_eq!(app.post_authed(&path, &token).await.status().as_u16(), 400);

    let response = app
        .post_authed(&format!("/api/products/{}/purchase", social), &token)
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.post_authed("/api/products/999/purchase", &token).await;
    assert_eq!(response.status().as_u16(), 404);

    let (price_paid, downloads) = sqlx::query_as::<_, (f64, i64)>(
        r#"
        SELECT pu.price_paid, p.downloads
        FROM purchases pu JOIN posts p ON pu.post_id = p.id
        WHERE pu.buyer_id = ?
        "#,
    )
    .bind(buyer)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(price_paid, 12.5);
    assert_eq!(downloads, 0);

    let (status, purchased) = app.get_json("/api/products/purchased", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(purchased[0]["product_title"], "Sample pack");
}

#[tokio::test]
async fn price_change_does_not_touch_past_purchases() {
    let app = spawn_app().await;
    let seller = app.insert_user("seller").await;
    let buyer = app.insert_user("buyer").await;
    let product = app.insert_product(seller, "Preset", 10.0).await;
    let token = app.token_for(buyer);

    app.post_authed(&format!("/api/products/{}/purchase", product), &token)
        .await;

    sqlx::query("UPDATE posts SET price = 99.0 WHERE id = ?")
        .bind(product)
        .execute(&app.pool)
        .await
        .unwrap();

    let paid = sqlx::query_scalar::<_, f64>("SELECT price_paid FROM purchases WHERE post_id = ?")
        .bind(product)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(paid, 10.0);
}

#[tokio::test]
async fn download_requires_ownership() {
    let app = spawn_app().await;
    let seller = app.insert_user("seller").await;
    let buyer = app.insert_user("buyer").await;
    let stranger = app.insert_user("stranger").await;
    let product = app.insert_product(seller, "Loops", 3.0).await;
    let download = format!("/api/products/{}/download", product);

    let response = app.post_authed(&download, &app.token_for(stranger)).await;
    assert_eq!(response.status().as_u16(), 403);

    let buyer_token = app.token_for(buyer);
    app.post_authed(&format!("/api/products/{}/purchase", product), &buyer_token)
        .await;
    let response = app.post_authed(&download, &buyer_token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["downloads"], 1);

    let response = app.post_authed(&download, &app.token_for(seller)).await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["downloads"], 2);
}
