/*!
 * Error types for the suberase application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with the translation provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur at the text detector boundary
#[derive(Error, Debug)]
pub enum DetectorError {
    /// The external detector command failed to run or exited non-zero
    #[error("Detector command failed: {0}")]
    CommandFailed(String),

    /// The detector's JSON output could not be parsed
    #[error("Failed to parse detector output: {0}")]
    ParseError(String),

    /// A detection record referenced a frame path without a numeric index
    #[error("Unparseable frame path in detector output: {0}")]
    BadFramePath(String),
}

/// Errors that can occur at the inpainting engine boundary
#[derive(Error, Debug)]
pub enum EngineError {
    /// The external engine command failed to run or exited non-zero
    #[error("Inpainting engine failed: {0}")]
    CommandFailed(String),

    /// The engine did not return a repaired frame for an input path
    #[error("Engine returned no repaired frame for {0}")]
    MissingFrame(PathBuf),

    /// A frame or mask image could not be loaded or decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Underlying I/O failure when exchanging files with the engine
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the translation provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the text detector
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    /// Error from the inpainting engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
