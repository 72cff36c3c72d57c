use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

/// Timeout for small queries. Whole-ledger queries run without one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn build_client() -> ClientResult<Client> {
    Client::builder()
        .build()
        .map_err(|e| ClientError::Protocol(format!("cannot build HTTP client: {e}")))
}

/// Decode a JSON response body, turning non-2xx statuses into
/// [`ClientError::Status`].
pub(crate) async fn read_json<T: DeserializeOwned>(uri: &str, response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::from_reqwest(uri, e))?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(format!("{uri}: {e}")))
}
