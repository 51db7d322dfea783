//! Rendering of engine answers for transport.

use std::fmt;

use serde::Serialize;

use crate::error::FormatError;

pub const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Wire format requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl OutputFormat {
    /// Interpret the `format` query parameter. Missing means plain; any value
    /// other than `json` or `plain` is served as plain with a warning.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some("plain") => OutputFormat::Plain,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                tracing::warn!(format = other, "unknown result format; falling back to plain");
                OutputFormat::Plain
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Plain => PLAIN_CONTENT_TYPE,
            OutputFormat::Json => JSON_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An engine answer. Created per query and dropped once the response is written.
pub trait QueryReport: Send {
    /// The engine's human-readable report.
    fn plain(&self) -> Vec<u8>;

    /// The answer as a JSON document.
    fn json(&self) -> serde_json::Result<Vec<u8>>;
}

/// Output captured from an engine that already rendered its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub stdout: Vec<u8>,
}

impl RawReport {
    pub fn new(stdout: Vec<u8>) -> Self {
        Self { stdout }
    }
}

impl QueryReport for RawReport {
    fn plain(&self) -> Vec<u8> {
        self.stdout.clone()
    }

    fn json(&self) -> serde_json::Result<Vec<u8>> {
        // Only pass through output that really is a JSON document.
        serde_json::from_slice::<serde::de::IgnoredAny>(&self.stdout)?;
        Ok(self.stdout.clone())
    }
}

/// A typed answer: plain text through `Display`, JSON through `Serialize`.
#[derive(Debug, Clone)]
pub struct StructuredReport<T>(pub T);

impl<T> QueryReport for StructuredReport<T>
where
    T: Serialize + fmt::Display + Send,
{
    fn plain(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    fn json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.0)
    }
}

/// A response body ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Serialize `report` in the requested format.
pub fn render(report: &dyn QueryReport, format: OutputFormat) -> Result<Rendered, FormatError> {
    let body = match format {
        OutputFormat::Plain => report.plain(),
        OutputFormat::Json => report.json().map_err(|source| FormatError {
            format: format.as_str(),
            source,
        })?,
    };
    Ok(Rendered {
        content_type: format.content_type(),
        body,
    })
}
