//! Blogging backend exposing a single GraphQL endpoint.
//!
//! - **Query**: `allBlogs`
//! - **Mutations**: `user` (register), `authenUser` (issue an access
//!   token), `createNewBlog` (requires a token)
//!
//! Users and posts are stored in SQLite through sqlx. Passwords are hashed
//! with argon2 and access tokens are HMAC-signed JWTs.

pub mod api;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod logging;
pub mod service;
