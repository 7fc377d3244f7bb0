use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use wear_core::error::BoxError;

/// A non-success reply, with the server's message when it sent one.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    http: Client,
    base: String,
    token_header: &'static str,
    token: Option<String>,
}

impl Endpoint {
    pub(crate) fn new(base: &str, token_header: &'static str, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token_header,
            token,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(self.token_header, token),
            None => request,
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(format!("{}{}", self.base, path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(format!("{}{}", self.base, path)))
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BoxError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        return Err(Box::new(ApiError { status, message }));
    }
    Ok(response.json().await?)
}
