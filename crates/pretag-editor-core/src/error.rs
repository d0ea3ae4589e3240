use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected input at byte {offset}")]
    #[diagnostic(code(pretag::markup::unexpected_input))]
    UnexpectedInput { offset: usize },

    #[error("closing </{name}> at byte {offset} does not match an open element")]
    #[diagnostic(
        code(pretag::markup::unexpected_close),
        help("every closing tag needs a matching opening tag")
    )]
    UnexpectedClose { name: String, offset: usize },

    #[error("element <{name}> is never closed")]
    #[diagnostic(code(pretag::markup::unclosed))]
    Unclosed { name: String },

    #[error("malformed element at byte {offset}: {source_text}")]
    #[diagnostic(code(pretag::markup::malformed_element))]
    MalformedElement { source_text: String, offset: usize },
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("error reading config file {path}")]
    #[diagnostic(code(pretag::config::read))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config")]
    #[diagnostic(code(pretag::config::parse))]
    Parse(#[from] toml::de::Error),

    #[error("editor id must not be empty")]
    #[diagnostic(
        code(pretag::config::empty_id),
        help("set `id` or leave it out to use the default")
    )]
    EmptyId,
}
