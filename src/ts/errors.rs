use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("TSX grammar could not be loaded into the parser")]
    LanguageSet,

    #[error("tree-sitter produced no tree for the source")]
    ParseFailed,

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },
}
