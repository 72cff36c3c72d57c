use snapmig_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("node unreachable at {uri}: {reason}")]
    Unavailable { uri: String, reason: String },

    #[error("node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid response content: {0}")]
    Protocol(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn from_reqwest(uri: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Unavailable {
                uri: uri.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unavailable { .. } => LedgerError::UpstreamUnavailable(err.to_string()),
            other => LedgerError::UpstreamProtocolError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_into_ledger_taxonomy() {
        let unavailable = ClientError::Unavailable {
            uri: "http://localhost:14265".into(),
            reason: "connection refused".into(),
        };
        assert!(matches!(LedgerError::from(unavailable), LedgerError::UpstreamUnavailable(_)));

        let status = ClientError::Status {
            status: 400,
            body: "{\"error\":\"invalid command\"}".into(),
        };
        assert!(matches!(LedgerError::from(status), LedgerError::UpstreamProtocolError(_)));
    }
}
