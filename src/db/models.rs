/// Row of the `user_info` table. `password` holds the argon2 PHC string.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub fullname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub fullname: Option<String>,
}

/// Row of the `blog` table. Posts carry no author reference.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
}
