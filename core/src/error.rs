//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors (output writes, template files).
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A programming-contract violation, e.g. a model without a template binding.
    #[from(ignore)]
    #[display("Configuration Error: {_0}")]
    Config(String),

    /// Neither the custom nor the built-in template directory holds the file.
    #[from(ignore)]
    #[display("Template not found: {}", path.display())]
    TemplateNotFound {
        /// The template identifier that could not be resolved.
        path: PathBuf,
    },

    /// Template compilation or rendering failed.
    #[from(ignore)]
    #[display("Template Error: {_0}")]
    Template(String),

    /// An input document could not be read as the expected shape.
    #[from(ignore)]
    #[display("Input Error: {_0}")]
    Input(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Input(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Input(format!("YAML: {}", err))
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        // String defaults to General, never to one of the named categories
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_template_not_found_carries_path() {
        let err = AppError::TemplateNotFound {
            path: PathBuf::from("pydantic_v2/Missing.jinja2"),
        };
        assert_eq!(
            format!("{}", err),
            "Template not found: pydantic_v2/Missing.jinja2"
        );
    }

    #[test]
    fn test_json_error_is_input() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Input(_)));
    }
}
