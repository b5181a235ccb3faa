//! Registration and token tests

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::common::TestApp;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_register_returns_user_without_hash(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;

    let response = app.register("alice", "wonderland-42").await?;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await?;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["is_admin"], false);
    assert!(body.get("password_hash").is_none());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_duplicate_username_conflicts(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;

    assert_eq!(app.register("alice", "wonderland-42").await?.status(), 201);
    assert_eq!(app.register("alice", "another-pass-1").await?.status(), 409);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_duplicate_email_conflicts(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;

    assert_eq!(app.register("alice", "wonderland-42").await?.status(), 201);

    let response = app
        .client
        .post(app.url("/users"))
        .json(&json!({
            "username": "alice2",
            "email": "ALICE@example.com",
            "password": "wonderland-42",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 409);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_login_issues_bearer_token(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    app.register("alice", "wonderland-42").await?;

    let response = app.login("alice", "wonderland-42").await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    let token = body["access_token"].as_str().unwrap_or_default();

    let me: Value = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["username"], "alice");
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_login_with_bad_credentials(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    app.register("alice", "wonderland-42").await?;

    let wrong_password = app.login("alice", "looking-glass").await?;
    assert_eq!(wrong_password.status(), 401);
    assert!(wrong_password.headers().contains_key("www-authenticate"));

    let unknown_user = app.login("bob", "wonderland-42").await?;
    assert_eq!(unknown_user.status(), 401);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_disabled_account_cannot_log_in(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool.clone()).await?;
    let token = app.token_for("alice").await?;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE username = 'alice'")
        .execute(&pool)
        .await?;

    assert_eq!(app.login("alice", "correct-horse-battery").await?.status(), 401);

    let me = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(me.status(), 401);
    Ok(())
}
