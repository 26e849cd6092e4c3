use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Error, Debug)]
pub enum PromptError {
    /// The template source does not parse
    #[error("Prompt template '{name}' is invalid: {detail}")]
    InvalidTemplate { name: String, detail: String },

    /// Rendering failed, typically a variable the template needs was not supplied
    #[error("Prompt template '{name}' failed to render: {detail}")]
    Render { name: String, detail: String },

    #[error("No prompt template named '{0}'")]
    NotRegistered(String),

    /// Template variables could not be turned into JSON
    #[error("Prompt variables could not be serialized: {0}")]
    Context(String),
}
