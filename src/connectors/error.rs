//! Connector-level errors surfaced to callers.

use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors a connector endpoint can return.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The wrapped API could not be reached, sent garbage, or refused.
    #[error("{connector} Connector Error: {source}")]
    Upstream {
        connector: &'static str,
        source: UpstreamError,
    },

    /// The caller's parameters or body are unusable.
    #[error("{connector} Connector Error: {message}")]
    BadRequest {
        connector: &'static str,
        message: String,
    },

    /// The token endpoint answered without an `access_token`.
    #[error("{connector} Connector Error: token response has no access_token")]
    MissingAccessToken { connector: &'static str },

    /// No configured instance under this slug.
    #[error("no {connector} connector named '{slug}'")]
    UnknownInstance { connector: &'static str, slug: String },
}

impl ConnectorError {
    pub fn upstream(connector: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| ConnectorError::Upstream { connector, source }
    }

    pub fn bad_request(connector: &'static str, message: impl Into<String>) -> Self {
        ConnectorError::BadRequest {
            connector,
            message: message.into(),
        }
    }

    /// Stable machine-readable class for the error envelope.
    pub fn class(&self) -> &'static str {
        match self {
            ConnectorError::Upstream { source, .. } => source.outcome(),
            ConnectorError::BadRequest { .. } => "bad_request",
            ConnectorError::MissingAccessToken { .. } => "missing_access_token",
            ConnectorError::UnknownInstance { .. } => "unknown_instance",
        }
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_messages_carry_connector_name() {
        let err = ConnectorError::upstream("iA.Delib")(UpstreamError::Decode {
            status: StatusCode::OK,
        });
        assert_eq!(err.to_string(), "iA.Delib Connector Error: bad JSON response");
        assert_eq!(err.class(), "decode_error");

        let err = ConnectorError::MissingAccessToken {
            connector: "Keycloak",
        };
        assert!(err.to_string().starts_with("Keycloak Connector Error"));
    }
}
