pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// In-place sanitization was asked to sanitize an element that the active
    /// configuration would itself remove or unwrap. Detected before any
    /// mutation, so the caller's element is unchanged.
    #[error("Root node is forbidden and cannot be sanitized in-place: <{tag_name}>")]
    ForbiddenRootNode { tag_name: String },
}
