//! HTTP client for the management backend
//!
//! Sends typed [`ApiRequest`]s and unwraps the `{success, message, data}`
//! envelope. Redirects are never followed: the backend answers requests
//! without a session by redirecting to `/login`, which is reported as
//! [`ApiError::Unauthorized`] instead of being parsed as a page.

use protocol::{ApiRequest, ApiResponse, LoginRequest, Method};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Response, StatusCode, redirect};
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::ApiError;

/// Backend client holding the session cookie
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: String,
}

impl ConsoleClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:5000`)
    ///
    /// # Example
    /// ```no_run
    /// use client::network::ConsoleClient;
    /// use protocol::BindDeviceRequest;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = ConsoleClient::new("http://127.0.0.1:5000", Duration::from_secs(10))?;
    ///     client.login("admin", "admin").await?;
    ///     let reply = client.send(&BindDeviceRequest::new("1-1.2")).await?;
    ///     println!("{}", reply.message_or("Device bound"));
    ///     Ok(())
    /// }
    /// ```
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and keep the session cookie for later calls
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        req.validate()?;

        let response = self
            .http
            .post(self.url(&req.endpoint().path()))
            .form(&req)
            .send()
            .await?;
        let status = response.status();

        if status.is_redirection() {
            if redirects_to_login(&response) {
                return Err(invalid_credentials());
            }
            info!("Logged in to {} as {}", self.base_url, username);
            return Ok(());
        }

        // Backends that answer the form with JSON instead of a redirect
        let body = response.text().await?;
        match ApiResponse::<IgnoredAny>::decode(&body) {
            Ok(reply) if reply.success => {
                info!("Logged in to {} as {}", self.base_url, username);
                Ok(())
            }
            Ok(reply) => Err(ApiError::Rejected {
                status: status.as_u16(),
                message: reply.message_or("Invalid username or password"),
            }),
            Err(_) => Err(invalid_credentials()),
        }
    }

    /// Validate, send and unwrap one request
    ///
    /// Returns the envelope only when the backend reported success; every
    /// other outcome is an [`ApiError`].
    pub async fn send<R: ApiRequest>(&self, req: &R) -> Result<ApiResponse<R::Data>, ApiError> {
        req.validate()?;

        let endpoint = req.endpoint();
        let url = self.url(&endpoint.path());
        debug!("{:?} {}", endpoint.method(), url);

        let builder = match endpoint.method() {
            Method::Get => self.http.get(&url).query(req),
            Method::Post => self.http.post(&url).form(req),
        };
        let response = builder.header(ACCEPT, "application/json").send().await?;
        let status = response.status();

        if status.is_redirection() {
            if redirects_to_login(&response) {
                return Err(ApiError::Unauthorized);
            }
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: format!("Unexpected redirect from {}", endpoint.path()),
            });
        }

        let body = response.text().await?;
        let reply = match ApiResponse::<R::Data>::decode(&body) {
            Ok(reply) => reply,
            Err(e) if status.is_success() => {
                warn!("Undecodable reply from {}: {}", endpoint.path(), e);
                return Err(ApiError::Decode(e.to_string()));
            }
            Err(_) => return Err(http_failure(status)),
        };

        if reply.success {
            Ok(reply)
        } else {
            debug!("{} rejected: {:?}", endpoint.path(), reply.message);
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message: reply.message_or(&format!("Request failed ({})", status)),
            })
        }
    }
}

fn redirects_to_login(response: &Response) -> bool {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|location| location.contains("/login"))
}

fn invalid_credentials() -> ApiError {
    ApiError::Rejected {
        status: StatusCode::UNAUTHORIZED.as_u16(),
        message: "Invalid username or password".to_string(),
    }
}

fn http_failure(status: StatusCode) -> ApiError {
    ApiError::Rejected {
        status: status.as_u16(),
        message: format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ConsoleClient::new("http://10.0.0.2:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.2:5000");
        assert_eq!(client.url("/bind_device"), "http://10.0.0.2:5000/bind_device");
    }

    #[tokio::test]
    async fn test_validation_happens_before_sending() {
        // Nothing listens on port 9; a sent request would be a Transport error
        let client = ConsoleClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client
            .send(&protocol::BindDeviceRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_http_failure_message() {
        let err = http_failure(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
        assert_eq!(err.severity(), protocol::Severity::Danger);
    }
}
