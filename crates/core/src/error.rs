#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A caller passed a value outside a closed set (unknown kind tag).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
