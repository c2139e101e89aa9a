use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("river `{0}` is not in the catalog and has no provider id")]
    UnresolvedEntity(String),
    #[error("river provider unavailable at `{url}`: {message}")]
    RemoteUnavailable { url: String, message: String },
    #[error("river provider returned a malformed payload from `{url}`: {message}")]
    MalformedResponse { url: String, message: String },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnresolvedEntity(_) => "unresolved_entity",
            Self::RemoteUnavailable { .. } => "remote_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The request could not be processed.",
            Self::UpstreamUnavailable { .. } => {
                "River data is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UpstreamUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl FetchError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::RemoteUnavailable { .. } | Self::MalformedResponse { .. } => {
                InterfaceError::UpstreamUnavailable { message, correlation_id }
            }
            // the router never lets an unresolved river reach the fetcher
            Self::UnresolvedEntity(_) => InterfaceError::Internal { message, correlation_id },
        }
    }
}
