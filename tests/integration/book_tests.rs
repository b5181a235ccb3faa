//! Catalog tests

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::common::TestApp;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_book_crud(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    let token = app.token_for("alice").await?;

    let created = app.create_book(&token, "978-0132350884", 3).await?;
    assert_eq!(created.status(), 201);
    let book: Value = created.json().await?;
    assert_eq!(book["isbn"], "9780132350884");
    assert_eq!(book["quantity"], 3);

    let fetched: Value = app
        .client
        .get(app.url("/books/978-0132350884"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["title"], "Clean Code");

    let updated = app
        .client
        .put(app.url("/books/978-0132350884"))
        .bearer_auth(&token)
        .json(&json!({ "isbn": "978-0132350884", "quantity": 5 }))
        .send()
        .await?;
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json().await?;
    assert_eq!(updated["quantity"], 5);
    assert_eq!(updated["author"], "Robert C. Martin");

    let deleted = app
        .client
        .delete(app.url("/books/978-0132350884"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(deleted.status(), 204);

    let missing = app.client.get(app.url("/books/978-0132350884")).send().await?;
    assert_eq!(missing.status(), 404);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_duplicate_isbn_conflicts(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    let token = app.token_for("alice").await?;

    assert_eq!(app.create_book(&token, "0132350882", 1).await?.status(), 201);
    assert_eq!(app.create_book(&token, "0132350882", 4).await?.status(), 409);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_isbn_spellings_share_one_book(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool.clone()).await?;
    let token = app.token_for("alice").await?;

    assert_eq!(app.create_book(&token, "978-0132350884", 1).await?.status(), 201);
    assert_eq!(app.create_book(&token, "9780132350884", 1).await?.status(), 409);
    assert_eq!(app.create_book(&token, "978 0 13 235088 4", 1).await?.status(), 409);
    assert_eq!(app.create_book(&token, "0-13-235088-x", 1).await?.status(), 201);
    assert_eq!(app.create_book(&token, "013235088X", 1).await?.status(), 409);

    let (books,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(&pool)
        .await?;
    assert_eq!(books, 2);

    let fetched: Value = app
        .client
        .get(app.url("/books/978-0-13-235088-4"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["isbn"], "9780132350884");

    let found: Vec<Value> = app
        .client
        .get(app.url("/books/search?q=978-01323"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(found.len(), 1);

    let borrowed = app.borrow(&token, "978 0132350884").await?;
    assert_eq!(borrowed.status(), 201);

    let updated = app
        .client
        .put(app.url("/books/9780132350884"))
        .bearer_auth(&token)
        .json(&json!({ "isbn": "978-0-13-235088-4", "quantity": 4 }))
        .send()
        .await?;
    assert_eq!(updated.status(), 200);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_create_rejects_bad_input(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    let token = app.token_for("alice").await?;

    assert_eq!(app.create_book(&token, "12345", 1).await?.status(), 422);
    assert_eq!(app.create_book(&token, "0132350882", -1).await?.status(), 422);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_update_with_mismatched_isbn(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    let token = app.token_for("alice").await?;
    app.create_book(&token, "0132350882", 1).await?;

    let response = app
        .client
        .put(app.url("/books/0132350882"))
        .bearer_auth(&token)
        .json(&json!({ "isbn": "9780132350884", "title": "Other" }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    let missing = app
        .client
        .put(app.url("/books/9780201633610"))
        .bearer_auth(&token)
        .json(&json!({ "isbn": "9780201633610", "quantity": 2 }))
        .send()
        .await?;
    assert_eq!(missing.status(), 404);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_list_and_search(pool: PgPool) -> Result<(), anyhow::Error> {
    let app = TestApp::spawn(pool).await?;
    let token = app.token_for("alice").await?;

    for (title, author, isbn, quantity) in [
        ("Clean Code", "Robert C. Martin", "9780132350884", 2),
        ("Refactoring", "Martin Fowler", "9780201485677", 0),
        ("Design Patterns", "Erich Gamma", "9780201633610", 5),
    ] {
        let response = app
            .client
            .post(app.url("/books"))
            .bearer_auth(&token)
            .json(&json!({
                "title": title,
                "author": author,
                "isbn": isbn,
                "quantity": quantity,
            }))
            .send()
            .await?;
        assert_eq!(response.status(), 201);
    }

    let page: Vec<Value> = app
        .client
        .get(app.url("/books?skip=1&limit=1"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["title"], "Refactoring");

    let martins: Vec<Value> = app
        .client
        .get(app.url("/books/search?q=martin"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(martins.len(), 2);

    let in_stock: Vec<Value> = app
        .client
        .get(app.url("/books/search?text=martin&min_quantity=1"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(in_stock.len(), 1);
    assert_eq!(in_stock[0]["isbn"], "9780132350884");

    let wildcard: Vec<Value> = app
        .client
        .get(app.url("/books/search?q=%25"))
        .send()
        .await?
        .json()
        .await?;
    assert!(wildcard.is_empty());

    let stats: Value = app
        .client
        .get(app.url("/books/stats"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stats["total_books"], 3);
    assert_eq!(stats["available_books"], 2);
    assert_eq!(stats["total_quantity"], 7);
    Ok(())
}
