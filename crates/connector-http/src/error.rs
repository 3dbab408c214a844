use thiserror::Error;

/// Errors raised by the transport, the dispatch action and the platform API client.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The platform API client was used without an org id or access token.
    #[error("No settings were found. You need to provide an IMS org id and an access token before using `fetch`.")]
    MissingFetchSettings,

    /// The platform API returned a body that does not parse as JSON.
    #[error("The response returned by \"{url}\" is not a valid JSON.")]
    InvalidJson { url: String },

    /// The platform API answered with a non-2xx status.
    #[error("The URL \"{url}\" has returned: {message}")]
    Api { url: String, message: String },

    /// A transport failure while loading a platform resource.
    #[error("{message} when loading {url}")]
    Load { url: String, message: String },

    /// Connection, DNS, TLS or protocol failure from the transport.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
