use assignment_engine::error::ContentError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("config error: {0}")]
    Config(String),
}
