pub type FadedeckResult<T> = Result<T, FadedeckError>;

#[derive(thiserror::Error, Debug)]
pub enum FadedeckError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("missing collaborator: {0}")]
    MissingCollaborator(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FadedeckError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn missing_collaborator(msg: impl Into<String>) -> Self {
        Self::MissingCollaborator(msg.into())
    }
}
