use async_graphql::SimpleObject;

use crate::db::models::{BlogPost, User};

#[derive(SimpleObject, Clone, Debug, PartialEq, Eq)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub content: String,
}

impl From<BlogPost> for Blog {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
        }
    }
}

/// Public view of a user. The password hash is never exposed.
#[derive(SimpleObject, Clone, Debug)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub fullname: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            fullname: user.fullname,
        }
    }
}

#[derive(SimpleObject, Debug)]
pub struct CreateUser {
    pub ok: bool,
    pub user: UserInfo,
}

#[derive(SimpleObject, Debug)]
pub struct AuthenUser {
    pub token: String,
}

#[derive(SimpleObject, Debug)]
pub struct CreateNewBlog {
    pub ok: bool,
}
