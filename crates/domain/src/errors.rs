use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Supplied {supplied} namespace names out of which only {unique} are unique")]
    AmbiguousNamespaces { supplied: usize, unique: usize },

    #[error("No cache namespaces supplied")]
    NoNamespaces,

    #[error("Cache must be started from within a Tokio runtime")]
    RuntimeUnavailable,
}
