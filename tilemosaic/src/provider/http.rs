//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use super::types::ProviderError;

/// Default timeout for a single tile request in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("tilemosaic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))?;

        if body.is_empty() {
            return Err(ProviderError::EmptyResponse(url.to_string()));
        }
        Ok(body.to_vec())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Encodes a solid-colour square PNG.
    pub fn png_tile(size: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png)
            .expect("Failed to encode PNG");
        buffer.into_inner()
    }

    /// Mock HTTP client that records every requested URL.
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, ProviderError>,
        /// Requests whose URL contains this text fail.
        pub fail_on: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(response: Result<Vec<u8>, ProviderError>) -> Self {
            Self {
                response,
                fail_on: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Serves solid PNG tiles of `size` pixels.
        pub fn serving_tiles(size: u32) -> Self {
            Self::new(Ok(png_tile(size, [40, 90, 160, 255])))
        }

        pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
            self.fail_on = Some(pattern.into());
            self
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.requests.lock().unwrap().push(url.to_string());
            if let Some(pattern) = &self.fail_on {
                if url.contains(pattern.as_str()) {
                    return Err(ProviderError::Status {
                        status: 404,
                        url: url.to_string(),
                    });
                }
            }
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient::new(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com/1/0/0.png").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.requested_urls(), vec!["http://example.com/1/0/0.png"]);
    }

    #[tokio::test]
    async fn test_mock_client_selective_failure() {
        let mock = MockAsyncHttpClient::serving_tiles(4).failing_on("/3/");

        assert!(mock.get("http://example.com/2/1/1.png").await.is_ok());
        assert!(mock.get("http://example.com/3/1/1.png").await.is_err());
        assert_eq!(mock.request_count(), 2);
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(AsyncReqwestClient::with_timeout(5).is_ok());
    }
}
