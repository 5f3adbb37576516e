//! Domain operations behind the GraphQL mutations and query.
//!
//! Every function takes the pool explicitly and reports expected failures
//! as [`BlogError`] variants; translation to GraphQL errors happens in the
//! resolvers.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::credentials::{self, TokenIssuer};
use crate::db::models::{BlogPost, NewBlogPost, NewUser, User};
use crate::db::repo;
use crate::error::{BlogError, Result};

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub fullname: Option<String>,
}

pub async fn register_user(
    pool: &SqlitePool,
    registration: Registration,
    fullname_required: bool,
) -> Result<User> {
    if fullname_required && registration.fullname.is_none() {
        return Err(BlogError::FullNameRequired);
    }

    if repo::get_user(pool, &registration.username).await?.is_some() {
        debug!(username = %registration.username, "registration for existing username");
        return Err(BlogError::UsernameTaken);
    }

    let password_hash = credentials::hash_password(&registration.password)?;
    let user = repo::insert_user(
        pool,
        &NewUser {
            username: registration.username,
            password_hash,
            fullname: registration.fullname,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

pub async fn authenticate_user(
    pool: &SqlitePool,
    issuer: &TokenIssuer,
    username: &str,
    password: &str,
) -> Result<String> {
    let user = repo::get_user(pool, username)
        .await?
        .ok_or(BlogError::UnknownUser)?;

    if !credentials::verify_password(password, &user.password)? {
        debug!(username, "password mismatch");
        return Err(BlogError::InvalidCredentials);
    }

    issuer.issue(&user.username)
}

/// Resolves the user a token speaks for. The token must verify, carry a
/// subject, and the subject must still exist.
pub async fn authorize(pool: &SqlitePool, issuer: &TokenIssuer, token: &str) -> Result<User> {
    let claims = issuer.decode(token)?;
    let username = claims.sub.ok_or(BlogError::InvalidCredentials)?;

    repo::get_user(pool, &username)
        .await?
        .ok_or(BlogError::InvalidCredentials)
}

pub async fn create_blog_post(
    pool: &SqlitePool,
    issuer: &TokenIssuer,
    post: NewBlogPost,
    token: &str,
) -> Result<BlogPost> {
    let author = authorize(pool, issuer, token).await?;
    let post = repo::insert_blog_post(pool, &post).await?;

    info!(post_id = post.id, username = %author.username, "created blog post");
    Ok(post)
}

pub async fn list_blog_posts(pool: &SqlitePool) -> Result<Vec<BlogPost>> {
    repo::list_blog_posts(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Claims;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    async fn setup() -> (SqlitePool, TokenIssuer) {
        let pool = repo::connect("sqlite::memory:", 1).await.unwrap();
        repo::create_tables(&pool).await.unwrap();
        (pool, TokenIssuer::new("secret", Algorithm::HS256, 1800))
    }

    fn registration(username: &str, password: &str, fullname: Option<&str>) -> Registration {
        Registration {
            username: username.to_string(),
            password: password.to_string(),
            fullname: fullname.map(str::to_string),
        }
    }

    fn post(title: &str, content: &str) -> NewBlogPost {
        NewBlogPost {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (pool, _) = setup().await;
        let user = register_user(&pool, registration("alice", "pw1", Some("Alice A")), true)
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password, "pw1");
        assert!(credentials::verify_password("pw1", &user.password).unwrap());
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let (pool, _) = setup().await;
        register_user(&pool, registration("alice", "pw1", Some("Alice A")), true)
            .await
            .unwrap();
        let err = register_user(&pool, registration("alice", "pw2", Some("Alice B")), true)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_fullname_requirement_is_configurable() {
        let (pool, _) = setup().await;
        let err = register_user(&pool, registration("alice", "pw1", None), true)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::FullNameRequired));

        let user = register_user(&pool, registration("alice", "pw1", None), false)
            .await
            .unwrap();
        assert!(user.fullname.is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (pool, issuer) = setup().await;
        register_user(&pool, registration("alice", "pw1", Some("Alice A")), true)
            .await
            .unwrap();

        let token = authenticate_user(&pool, &issuer, "alice", "pw1")
            .await
            .unwrap();
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("alice"));

        let err = authenticate_user(&pool, &issuer, "alice", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCredentials));

        let err = authenticate_user(&pool, &issuer, "nobody", "pw1")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::UnknownUser));
    }

    #[tokio::test]
    async fn test_create_post_requires_valid_token() {
        let (pool, issuer) = setup().await;
        register_user(&pool, registration("alice", "pw1", Some("Alice A")), true)
            .await
            .unwrap();
        let token = authenticate_user(&pool, &issuer, "alice", "pw1")
            .await
            .unwrap();

        let created = create_blog_post(&pool, &issuer, post("Hi", "World"), &token)
            .await
            .unwrap();
        assert_eq!(list_blog_posts(&pool).await.unwrap(), vec![created]);

        let err = create_blog_post(&pool, &issuer, post("No", "Way"), "garbage")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCredentials));
        assert_eq!(list_blog_posts(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_token_without_subject_is_rejected() {
        let (pool, issuer) = setup().await;
        register_user(&pool, registration("alice", "pw1", Some("Alice A")), true)
            .await
            .unwrap();

        let claims = Claims {
            sub: None,
            exp: jsonwebtoken::get_current_timestamp() + 600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = create_blog_post(&pool, &issuer, post("Hi", "World"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCredentials));
        assert!(list_blog_posts(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_rejected() {
        let (pool, issuer) = setup().await;
        let token = issuer.issue("ghost").unwrap();

        let err = create_blog_post(&pool, &issuer, post("Hi", "World"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCredentials));
        assert!(list_blog_posts(&pool).await.unwrap().is_empty());
    }
}
