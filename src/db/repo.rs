use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::db::models::{BlogPost, NewBlogPost, NewUser, User};
use crate::error::{BlogError, Result};

/// Opens a pool for `db_url`.
///
/// An in-memory database only lives as long as its connection, so those
/// get a single connection that is never recycled.
pub async fn connect(
    db_url: &str,
    max_connections: u32,
) -> std::result::Result<SqlitePool, sqlx::Error> {
    let options = if is_in_memory(db_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    options.connect(db_url).await
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

pub async fn create_tables(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL,
            fullname TEXT UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blog (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_user(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password, fullname FROM user_info WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Inserts a user. Uniqueness is enforced by the table, so two concurrent
/// registrations of one username cannot both succeed.
pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO user_info (username, password, fullname)
        VALUES (?, ?, ?)
        RETURNING id, username, password, fullname
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.fullname)
    .fetch_one(pool)
    .await
    .map_err(map_user_constraint)
}

pub async fn insert_blog_post(pool: &SqlitePool, post: &NewBlogPost) -> Result<BlogPost> {
    let post = sqlx::query_as::<_, BlogPost>(
        r#"
        INSERT INTO blog (title, content)
        VALUES (?, ?)
        RETURNING id, title, content
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .fetch_one(pool)
    .await?;

    Ok(post)
}

pub async fn list_blog_posts(pool: &SqlitePool) -> Result<Vec<BlogPost>> {
    let posts = sqlx::query_as::<_, BlogPost>("SELECT id, title, content FROM blog ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(posts)
}

fn map_user_constraint(err: sqlx::Error) -> BlogError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        let message = db_err.message();
        if message.contains("user_info.username") {
            return BlogError::UsernameTaken;
        }
        if message.contains("user_info.fullname") {
            return BlogError::FullNameTaken;
        }
    }
    BlogError::Storage(err)
}
