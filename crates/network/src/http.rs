// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A thin JSON-over-HTTP client for public REST endpoints.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use serde::Serialize;
use serde_json::Value;

use crate::{error::HttpClientError, tls::install_cryptographic_provider};

/// Default timeout applied to every request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Provides JSON GET/POST against public REST endpoints.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a new [`HttpClient`] with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, HttpClientError> {
        install_cryptographic_provider();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpClientError::from)?;
        Ok(Self { client })
    }

    /// Sends a GET request and parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an invalid body.
    pub async fn get_json(&self, url: &str) -> Result<Value, HttpClientError> {
        tracing::debug!(url, "GET");
        let request = self.client.get(url).header(USER_AGENT, poscalc_core::consts::USER_AGENT);
        Self::execute(request, url).await
    }

    /// Sends a POST request with a JSON body and parses the response as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an invalid body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Value, HttpClientError> {
        tracing::debug!(url, "POST");
        let request = self
            .client
            .post(url)
            .header(USER_AGENT, poscalc_core::consts::USER_AGENT)
            .json(body);
        Self::execute(request, url).await
    }

    async fn execute(
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Value, HttpClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(HttpClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    async fn start_test_server() -> String {
        let router = Router::new()
            .route("/ticker", get(|| async { Json(json!({"price": "101.5"})) }))
            .route(
                "/echo",
                post(|Json(body): Json<Value>| async move { Json(body) }),
            )
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such symbol") }),
            )
            .route("/garbage", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_json() {
        let base = start_test_server().await;
        let client = HttpClient::new(DEFAULT_HTTP_TIMEOUT).unwrap();

        let value = client.get_json(&format!("{base}/ticker")).await.unwrap();

        assert_eq!(value["price"], "101.5");
    }

    #[rstest]
    #[tokio::test]
    async fn test_post_json() {
        let base = start_test_server().await;
        let client = HttpClient::new(DEFAULT_HTTP_TIMEOUT).unwrap();

        let value = client
            .post_json(&format!("{base}/echo"), &json!({"id": 7}))
            .await
            .unwrap();

        assert_eq!(value["id"], 7);
    }

    #[rstest]
    #[tokio::test]
    async fn test_non_success_status() {
        let base = start_test_server().await;
        let client = HttpClient::new(DEFAULT_HTTP_TIMEOUT).unwrap();

        let err = client
            .get_json(&format!("{base}/missing"))
            .await
            .unwrap_err();

        match err {
            HttpClientError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such symbol");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_invalid_body() {
        let base = start_test_server().await;
        let client = HttpClient::new(DEFAULT_HTTP_TIMEOUT).unwrap();

        let err = client
            .get_json(&format!("{base}/garbage"))
            .await
            .unwrap_err();

        assert!(matches!(err, HttpClientError::Json(_)));
    }
}
