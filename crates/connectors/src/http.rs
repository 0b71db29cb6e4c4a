use reqwest::Response;
use runtime::ServiceError;
use serde::de::DeserializeOwned;

pub(crate) fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

/// Decode a JSON body, turning non-2xx statuses into [`ServiceError::Http`].
pub(crate) async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Http {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))
}
