//! Native network access for hosts running the worker outside a browser.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};

use crate::worker::error::{internal_error, invalid_argument, network_failed, WorkerResult};
use crate::worker::platform::NetworkFetcher;
use crate::worker::types::{FetchRequest, FetchResponse};

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> WorkerResult<Self> {
        let http = Client::builder()
            .user_agent(format!("nexcard-sw/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| internal_error(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> WorkerResult<FetchResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|err| {
            invalid_argument(format!("Invalid HTTP method '{}': {err}", request.method))
        })?;
        let response = self
            .http
            .request(method, request.url.as_str())
            .headers(header_map(&request.headers)?)
            .send()
            .await
            .map_err(|err| network_failed(format!("Request to {} failed: {err}", request.url)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|err| {
            network_failed(format!("Failed to read response from {}: {err}", request.url))
        })?;

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

fn header_map(headers: &[(String, String)]) -> WorkerResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| invalid_argument(format!("Invalid header name: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| invalid_argument(format!("Invalid header value: {err}")))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset_server, start_mock_server};
    use crate::worker::memory::MemoryCacheStore;
    use crate::worker::platform::CacheStore;
    use crate::worker::precache::{PrecacheController, PrecacheEntry, PrecacheManifest};
    use crate::worker::settings::PrecacheSettings;
    use httpmock::prelude::*;

    #[tokio::test(flavor = "current_thread")]
    async fn forwards_method_and_headers() {
        let server = start_mock_server();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/assets/app.js")
                .header("accept", "application/javascript");
            then.status(200)
                .header("content-type", "application/javascript")
                .body("console.log(1)");
        });

        let mut request = FetchRequest::get(server.url("/assets/app.js"));
        request
            .headers
            .push(("accept".into(), "application/javascript".into()));
        let response = HttpFetcher::new().unwrap().fetch(&request).await.unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("application/javascript"));
        assert_eq!(response.body, "console.log(1)");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn non_success_status_is_returned_not_raised() {
        let server = start_mock_server();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let response = HttpFetcher::new()
            .unwrap()
            .fetch(&FetchRequest::get(server.url("/missing")))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.ok());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn connection_failure_maps_to_network_error() {
        let err = HttpFetcher::new()
            .unwrap()
            .fetch(&FetchRequest::get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "sw/network-failed");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn invalid_method_is_rejected() {
        let mut request = FetchRequest::get("http://localhost/");
        request.method = "BAD METHOD".into();
        let err = HttpFetcher::new().unwrap().fetch(&request).await.unwrap_err();
        assert_eq!(err.code_str(), "sw/invalid-argument");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn precache_installs_over_http() {
        let server = asset_server(&[("/index.html", "<html>"), ("/app.js", "js")]);
        let scope = url::Url::parse(&server.url("/")).unwrap();
        let manifest = PrecacheManifest::new(vec![
            PrecacheEntry::new("index.html", Some("r1".into())),
            PrecacheEntry::new("app.js", None),
        ]);
        let controller =
            PrecacheController::new(&manifest, &scope, PrecacheSettings::default()).unwrap();
        let cache = MemoryCacheStore::new();

        let report = controller
            .install(&cache, &HttpFetcher::new().unwrap())
            .await
            .unwrap();
        assert_eq!(report.updated.len(), 2);
        let key = controller.cache_key_for(&server.url("/")).unwrap();
        let stored = cache.get(controller.cache_name(), key).await.unwrap().unwrap();
        assert_eq!(stored.body, "<html>");
    }
}
