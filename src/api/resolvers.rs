use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Object, Schema};
use tracing::error;

use crate::api::schema::{AuthenUser, Blog, CreateNewBlog, CreateUser};
use crate::api::server::AppState;
use crate::db::models::NewBlogPost;
use crate::error::BlogError;
use crate::service::{self, Registration};

pub type BlogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: Arc<AppState>) -> BlogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

fn app_state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<AppState>> {
    ctx.data::<Arc<AppState>>()
}

/// Single translation point from domain errors to GraphQL errors.
/// Infrastructure failures are logged and hidden behind a generic message.
fn graphql_error(err: BlogError) -> async_graphql::Error {
    if err.is_domain() {
        async_graphql::Error::new(err.to_string())
    } else {
        error!(error = %err, "request failed");
        async_graphql::Error::new("Internal server error")
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every blog post in storage
    async fn all_blogs(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Blog>> {
        let state = app_state(ctx)?;
        let posts = service::list_blog_posts(&state.db)
            .await
            .map_err(graphql_error)?;
        Ok(posts.into_iter().map(Blog::from).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Register a new user
    async fn user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
        fullname: Option<String>,
    ) -> async_graphql::Result<CreateUser> {
        let state = app_state(ctx)?;
        let registration = Registration {
            username,
            password,
            fullname,
        };
        let user = service::register_user(&state.db, registration, state.fullname_required)
            .await
            .map_err(graphql_error)?;

        Ok(CreateUser {
            ok: true,
            user: user.into(),
        })
    }

    /// Exchange username and password for an access token
    async fn authen_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> async_graphql::Result<AuthenUser> {
        let state = app_state(ctx)?;
        let token = service::authenticate_user(&state.db, &state.tokens, &username, &password)
            .await
            .map_err(graphql_error)?;
        Ok(AuthenUser { token })
    }

    /// Create a blog post on behalf of the token's user
    async fn create_new_blog(
        &self,
        ctx: &Context<'_>,
        title: String,
        content: String,
        token: String,
    ) -> async_graphql::Result<CreateNewBlog> {
        let state = app_state(ctx)?;
        service::create_blog_post(
            &state.db,
            &state.tokens,
            NewBlogPost { title, content },
            &token,
        )
        .await
        .map_err(graphql_error)?;
        Ok(CreateNewBlog { ok: true })
    }
}
