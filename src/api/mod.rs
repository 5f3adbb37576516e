pub mod resolvers;
pub mod schema;
pub mod server;

pub use resolvers::{BlogSchema, build_schema};
pub use server::{AppState, router, start_server};
