// Buffered HTTP response.
//
// The body is read eagerly so callers can inspect the status, report the
// raw text on failure, and decode JSON without holding the connection.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// A fully-read response from the controller.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub(crate) async fn read(resp: reqwest::Response) -> Result<Self, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        Ok(Self { status, body })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// `true` if the response carries exactly the `expected` status.
    pub fn is(&self, expected: StatusCode) -> bool {
        self.status == expected
    }

    /// Pass the response through if it has the `expected` status,
    /// otherwise turn it into an [`Error::Http`].
    pub fn require(self, expected: StatusCode) -> Result<Self, Error> {
        if self.is(expected) {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| {
            let end = self
                .body
                .char_indices()
                .nth(200)
                .map_or(self.body.len(), |(i, _)| i);
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", &self.body[..end]),
                body: self.body.clone(),
            }
        })
    }

    pub fn into_error(self) -> Error {
        Error::Http {
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}
