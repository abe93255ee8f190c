/*!
 * Error types for the yashwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to an oracle backend
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

/// Errors that can occur while decoding a subtitle source
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The raw file could not be read
    #[error("Failed to read subtitle file {path}: {message}")]
    Read {
        /// Path of the subtitle file
        path: String,
        /// Underlying I/O message
        message: String,
    },

    /// The content decoded but contained no usable entries
    #[error("No valid subtitle entries were found: {0}")]
    NoEntries(String),

    /// A timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors raised by the codec layer
#[derive(Error, Debug)]
pub enum MediaError {
    /// ffmpeg or ffprobe could not be started
    #[error("Failed to execute {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: String,
        /// Underlying error message
        message: String,
    },

    /// The tool exited with a non-zero status
    #[error("{tool} failed: {message}")]
    Failed {
        /// Tool name
        tool: String,
        /// Filtered stderr
        message: String,
    },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// Probe output could not be interpreted
    #[error("Failed to probe media: {0}")]
    Probe(String),

    /// Nothing to assemble
    #[error("No segments to assemble")]
    NoSegments,
}

/// Errors of the selection and convergence pipeline
#[derive(Error, Debug)]
pub enum SummaryError {
    /// No units survive filtering, or a summary resolved to nothing usable
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    /// The oracle's summary contained no resolvable indexed lines
    #[error("Malformed oracle output: {0}")]
    MalformedOracleOutput(String),

    /// The duration search ran out of iterations
    #[error(
        "Failed to converge on {target:.2}s after {iterations} iterations \
         (last requested {last_requested} units, achieved {last_achieved:.2}s)"
    )]
    ConvergenceFailure {
        /// Number of oracle calls made
        iterations: usize,
        /// Size estimate of the final attempt
        last_requested: usize,
        /// Duration achieved by the final attempt
        last_achieved: f64,
        /// Requested duration
        target: f64,
    },

    /// The oracle could not be reached or answered with a failure status
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] ProviderError),

    /// The subtitle or media source could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<SubtitleError> for SummaryError {
    fn from(error: SubtitleError) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from an oracle backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle decoding
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the codec layer
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Error from selection or convergence
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

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
