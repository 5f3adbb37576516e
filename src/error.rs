use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Username already registered")]
    UsernameTaken,

    #[error("Username not existed")]
    UnknownUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Full name is required")]
    FullNameRequired,

    #[error("Full name already registered")]
    FullNameTaken,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl BlogError {
    /// Expected failures caused by the caller's input, as opposed to
    /// infrastructure faults.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            BlogError::UsernameTaken
                | BlogError::UnknownUser
                | BlogError::InvalidCredentials
                | BlogError::FullNameRequired
                | BlogError::FullNameTaken
        )
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
