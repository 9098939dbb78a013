//! The HTTP boundary of the crate.
//!
//! Everything that talks to the network goes through [`HttpTransport`]. The
//! default implementation, [`ReqwestTransport`], wraps a `reqwest::Client`, so
//! connection pooling, timeouts and proxies are whatever that client was
//! configured with. Callers that want full control can hand in their own client
//! or their own transport implementation.

use crate::config::ClientConfig;
use crate::http::error::TransportError;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A GET-only JSON capability against a fixed base URL.
///
/// `route` is relative to the base URL (e.g. `/stations/MAPL/measures`), and
/// `query` holds the query-string pairs in the order they should be sent.
///
/// Implementations must be safe to call concurrently; the fetch executor issues
/// all per-station requests at once through a shared reference.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, route: &str, query: &[(String, String)])
        -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn get_json(
        &self,
        route: &str,
        query: &[(String, String)],
    ) -> Result<Value, TransportError> {
        (**self).get_json(route, query).await
    }
}

/// [`HttpTransport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Wraps an existing client. The client's own timeout, proxy and pool
    /// settings apply to every request.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds a client from a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NetworkRequest`] if reqwest cannot build the
    /// client (e.g. the TLS backend failed to initialise).
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| TransportError::NetworkRequest(config.base_url.clone(), e))?;
        Ok(Self::new(client, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(
        &self,
        route: &str,
        query: &[(String, String)],
    ) -> Result<Value, TransportError> {
        let url = self.url_for(route);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(TransportError::HttpStatus { url, status });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::JsonDecode { url, source: e })
    }
}

/// Caps how many requests an inner transport has in flight at once.
///
/// Requests over the cap wait for a permit before they are sent, so a large
/// fan-out never opens more than `max_in_flight` connections.
#[derive(Debug)]
pub struct ConnectionLimit<T> {
    inner: T,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl<T> ConnectionLimit<T> {
    /// A cap of zero is treated as one.
    pub fn new(inner: T, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for ConnectionLimit<T> {
    async fn get_json(
        &self,
        route: &str,
        query: &[(String, String)],
    ) -> Result<Value, TransportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TransportError::Unavailable {
                url: route.to_string(),
                message: e.to_string(),
            })?;
        self.inner.get_json(route, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use futures_util::future::join_all;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn joins_routes_without_doubled_slashes() {
        let transport = ReqwestTransport::new(Client::new(), "https://example.org/api/v1/");
        assert_eq!(transport.base_url(), "https://example.org/api/v1");
        assert_eq!(
            transport.url_for("/stations/"),
            "https://example.org/api/v1/stations/"
        );
        assert_eq!(
            transport.url_for("fields/MAPL/available_fields"),
            "https://example.org/api/v1/fields/MAPL/available_fields"
        );
    }

    #[tokio::test]
    #[ignore = "hits the live Wisconet API"]
    async fn live_station_list_is_an_array() -> Result<(), TransportError> {
        let config = ClientConfig::builder().build();
        let transport = ReqwestTransport::from_config(&config)?;
        let body = transport.get_json("/stations/", &[]).await?;
        assert!(body.as_array().is_some_and(|stations| !stations.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn connection_limit_caps_requests_in_flight() -> Result<(), TransportError> {
        let fake = FakeTransport::new()
            .with_json("/stations/", json!([]))
            .with_delay("/stations/", Duration::from_millis(20));
        let limited = ConnectionLimit::new(fake, 2);

        let results = join_all((0..6).map(|_| limited.get_json("/stations/", &[]))).await;
        for result in results {
            result?;
        }
        assert_eq!(limited.inner().calls(), 6);
        assert_eq!(limited.inner().peak_in_flight(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn zero_cap_still_lets_requests_through() -> Result<(), TransportError> {
        let limited = ConnectionLimit::new(FakeTransport::new().with_json("/stations/", json!([])), 0);
        assert_eq!(limited.max_in_flight(), 1);
        limited.get_json("/stations/", &[]).await?;
        Ok(())
    }
}
