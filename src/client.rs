/// Coastal Monitoring observations API client.
///
/// Retrieves sensor observations from
///   https://coastalmonitoring.org/observations/{endpoint}/{YYYYMMDDHHMMSS}?sensor={name}
///
/// API documentation: https://coastalmonitoring.org/ccoresources/api/
///
/// A client owns one transport session at a time. Requests are only allowed
/// while a session is open; `open()` hands back a `Session` guard that
/// closes the transport when it goes out of scope, whichever way the scope
/// is left.
///
/// Each call is one blocking GET: no retry, no caching, no pagination.

use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, REFERER};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::ingest::normalize::format_request_timestamp;
use crate::ingest::waves::parse_observation;
use crate::model::{ClientError, Endpoint, Observation};

/// `X-API-Key`; header names are case-insensitive and `http` stores them lowercase.
pub const API_KEY_HEADER: &str = "x-api-key";
pub const ACCEPT_JSON: &str = "application/json";

// ============================================================================
// Transport seam
// ============================================================================

/// Fixed headers attached to every request of a session.
#[derive(Clone, PartialEq)]
pub struct SessionHeaders {
    pub api_key: String,
    pub referer: String,
}

impl fmt::Debug for SessionHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHeaders")
            .field("api_key", &"<redacted>")
            .field("referer", &"<redacted>")
            .finish()
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Empty when `status >= 400`; error bodies are never read.
    pub body: String,
}

/// The HTTP layer underneath the client.
///
/// `HttpTransport` is the production implementation; tests substitute an
/// in-memory one.
pub trait Transport {
    /// Prepares a session carrying `headers` on every request.
    fn open(&mut self, headers: &SessionHeaders, timeout: Duration) -> Result<(), ClientError>;

    /// Releases the session. Must be safe to call when not open.
    fn close(&mut self);

    /// Issues a GET for `url` with the given query parameters.
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<TransportResponse, ClientError>;
}

/// Blocking reqwest transport.
#[derive(Debug, Default)]
pub struct HttpTransport {
    client: Option<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport { client: None }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|_| {
        ClientError::config(format!("{} contains characters not allowed in an HTTP header", name))
    })
}

impl Transport for HttpTransport {
    fn open(&mut self, headers: &SessionHeaders, timeout: Duration) -> Result<(), ClientError> {
        let mut api_key = header_value("api_key", &headers.api_key)?;
        api_key.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        default_headers.insert(REFERER, header_value("referer", &headers.referer)?);
        default_headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let client = reqwest::blocking::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) {
        self.client = None;
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<TransportResponse, ClientError> {
        let client = self.client.as_ref().ok_or(ClientError::NotConnected)?;

        let response = client.get(url).query(query).send()?;
        let status = response.status().as_u16();

        let body = if status >= 400 {
            String::new()
        } else {
            response.text()?
        };

        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Coastal Monitoring observations API.
///
/// ```no_run
/// use chrono::{TimeZone, Utc};
/// use coastal_monitoring_client::{ClientConfig, CoastalMonitoringClient};
///
/// let mut client = CoastalMonitoringClient::new(ClientConfig::new("my-key", "https://example.org"));
/// let session = client.open()?;
/// let observation = session.get_observation_of_waves(
///     "Porthleven",
///     Utc.with_ymd_and_hms(2025, 1, 4, 9, 30, 0).unwrap(),
/// )?;
/// # Ok::<(), coastal_monitoring_client::ClientError>(())
/// ```
pub struct CoastalMonitoringClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
    connected: bool,
}

impl CoastalMonitoringClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> CoastalMonitoringClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        CoastalMonitoringClient {
            config,
            transport,
            connected: false,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Opens the transport session. The session stays open until the
    /// returned guard is dropped.
    ///
    /// Opening an already open client reuses the existing session.
    pub fn open(&mut self) -> Result<Session<'_, T>, ClientError> {
        if !self.connected {
            self.config.validate()?;
            let headers = SessionHeaders {
                api_key: self.config.api_key.clone(),
                referer: self.config.referer.clone(),
            };
            self.transport.open(&headers, self.config.timeout)?;
            self.connected = true;
            debug!(base_url = %self.config.base_url, "Session created");
        }
        Ok(Session { client: self })
    }

    /// Closes the transport session. Idempotent.
    pub fn close(&mut self) {
        if self.connected {
            self.transport.close();
            self.connected = false;
            debug!("Session closed");
        }
    }

    /// Runs `f` inside a session, closing it afterwards even if `f` fails.
    pub fn with_session<R>(
        &mut self,
        f: impl FnOnce(&Self) -> Result<R, ClientError>,
    ) -> Result<R, ClientError> {
        let session = self.open()?;
        f(&*session)
    }

    /// Wave observation for `sensor_name` closest to `timestamp`.
    ///
    /// # Errors
    /// - `ClientError::NotConnected` — no open session.
    /// - `ClientError::RequestFailed` — HTTP status >= 400; the body is not parsed.
    /// - `ClientError::Transport` — the request did not complete.
    /// - any parse error from `ingest::waves::parse_observation`, unchanged.
    pub fn get_observation_of_waves(
        &self,
        sensor_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Observation, ClientError> {
        let body = self.fetch(Endpoint::Waves, sensor_name, timestamp)?;
        parse_observation(&body)
    }

    /// `{base_url}/{endpoint}/{YYYYMMDDHHMMSS}`
    pub fn endpoint_url(&self, endpoint: Endpoint, timestamp: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url,
            endpoint.segment(),
            format_request_timestamp(&timestamp)
        )
    }

    fn fetch(
        &self,
        endpoint: Endpoint,
        sensor_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<String, ClientError> {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }

        let url = self.endpoint_url(endpoint, timestamp);
        debug!(%url, sensor = sensor_name, "Requesting {} observation", endpoint);

        let response = self.transport.get(&url, &[("sensor", sensor_name)])?;

        if response.status >= 400 {
            warn!(
                status = response.status,
                sensor = sensor_name,
                "Observations API returned an error status"
            );
            return Err(ClientError::RequestFailed {
                status_code: response.status,
            });
        }

        Ok(response.body)
    }
}

impl<T> fmt::Debug for CoastalMonitoringClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoastalMonitoringClient")
            .field("config", &self.config)
            .field("connected", &self.connected)
            .finish()
    }
}

// ============================================================================
// Scoped session
// ============================================================================

/// An open session. Derefs to the client; closes the transport on drop.
pub struct Session<'a, T: Transport> {
    client: &'a mut CoastalMonitoringClient<T>,
}

impl<T: Transport> Deref for Session<'_, T> {
    type Target = CoastalMonitoringClient<T>;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.client.close();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::fixture_porthleven_json;
    use chrono::TimeZone;
    use std::cell::RefCell;

    /// In-memory transport that replays one canned response and records
    /// what it was asked for.
    #[derive(Default)]
    struct StubTransport {
        status: u16,
        body: String,
        opened_with: Option<(SessionHeaders, Duration)>,
        open_count: usize,
        close_count: usize,
        requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Self {
            StubTransport {
                status,
                body: body.to_string(),
                ..Default::default()
            }
        }
    }

    impl Transport for StubTransport {
        fn open(&mut self, headers: &SessionHeaders, timeout: Duration) -> Result<(), ClientError> {
            self.opened_with = Some((headers.clone(), timeout));
            self.open_count += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.close_count += 1;
        }

        fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<TransportResponse, ClientError> {
            self.requests.borrow_mut().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ));
            Ok(TransportResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn client_with(stub: StubTransport) -> CoastalMonitoringClient<StubTransport> {
        CoastalMonitoringClient::with_transport(ClientConfig::new("anything", "anything"), stub)
    }

    fn porthleven_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_endpoint_url_uses_compact_timestamp() {
        let client = client_with(StubTransport::default());
        assert_eq!(
            client.endpoint_url(Endpoint::Waves, porthleven_time()),
            "https://coastalmonitoring.org/observations/waves/20250104093000"
        );
        assert_eq!(
            client.endpoint_url(Endpoint::TidePredictions, porthleven_time()),
            "https://coastalmonitoring.org/observations/tidepredictions/20250104093000"
        );
    }

    #[test]
    fn test_request_before_open_is_not_connected() {
        let client = client_with(StubTransport::replying(200, fixture_porthleven_json()));
        let result = client.get_observation_of_waves("Porthleven", porthleven_time());
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(client.transport().requests.borrow().is_empty(), "no request should be sent");
    }

    #[test]
    fn test_session_fetches_and_parses_waves() {
        let mut client = client_with(StubTransport::replying(200, fixture_porthleven_json()));

        let obs = {
            let session = client.open().expect("open should succeed");
            session
                .get_observation_of_waves("Porthleven", porthleven_time())
                .expect("fixture should parse")
        };

        assert_eq!(obs.features[0].properties.sensor, "Porthleven");

        let requests = client.transport().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://coastalmonitoring.org/observations/waves/20250104093000"
        );
        assert_eq!(requests[0].1, vec![("sensor".to_string(), "Porthleven".to_string())]);
    }

    #[test]
    fn test_session_passes_headers_and_timeout_to_transport() {
        let config = ClientConfig::new("key-123", "https://example.org")
            .with_timeout(Duration::from_secs(5));
        let mut client = CoastalMonitoringClient::with_transport(config, StubTransport::default());
        drop(client.open().expect("open"));

        let (headers, timeout) = client
            .transport()
            .opened_with
            .clone()
            .expect("transport should have been opened");
        assert_eq!(headers.api_key, "key-123");
        assert_eq!(headers.referer, "https://example.org");
        assert_eq!(timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_session_guard_closes_on_drop() {
        let mut client = client_with(StubTransport::replying(200, fixture_porthleven_json()));
        {
            let session = client.open().expect("open");
            assert!(session.is_connected());
        }
        assert!(!client.is_connected());
        assert_eq!(client.transport().close_count, 1);

        let after = client.get_observation_of_waves("Porthleven", porthleven_time());
        assert!(matches!(after, Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_with_session_closes_on_error_path() {
        let mut client = client_with(StubTransport::replying(500, ""));

        let result = client.with_session(|c| c.get_observation_of_waves("Porthleven", porthleven_time()));

        assert!(matches!(result, Err(ClientError::RequestFailed { status_code: 500 })));
        assert!(!client.is_connected(), "session must be closed after an error");
        assert_eq!(client.transport().close_count, 1);
    }

    #[test]
    fn test_session_guard_closes_on_panic() {
        let mut client = client_with(StubTransport::default());
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _session = client.open().expect("open");
            panic!("caller bailed out mid-session");
        }));
        assert!(outcome.is_err());
        assert!(!client.is_connected());
        assert_eq!(client.transport().close_count, 1);
    }

    #[test]
    fn test_error_status_is_not_parsed() {
        // A body that would fail parsing proves the status check comes first.
        let mut client = client_with(StubTransport::replying(404, "not json"));
        let session = client.open().expect("open");

        let result = session.get_observation_of_waves("Nowhere", porthleven_time());
        assert!(matches!(result, Err(ClientError::RequestFailed { status_code: 404 })));
    }

    #[test]
    fn test_validation_errors_propagate_unchanged() {
        let body = fixture_porthleven_json().replace("\"sst\": \"11.3\",", "");
        let mut client = client_with(StubTransport::replying(200, &body));
        let session = client.open().expect("open");

        match session.get_observation_of_waves("Porthleven", porthleven_time()) {
            Err(ClientError::Validation { field, .. }) => {
                assert_eq!(field, "features[0].properties.sst");
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_reopening_reuses_session_and_close_is_idempotent() {
        let mut client = client_with(StubTransport::default());
        drop(client.open().expect("first open"));
        drop(client.open().expect("second open"));
        client.close();
        client.close();

        assert_eq!(client.transport().open_count, 2);
        assert_eq!(client.transport().close_count, 2);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut client = CoastalMonitoringClient::with_transport(
            ClientConfig::new("", "https://example.org"),
            StubTransport::default(),
        );
        assert!(matches!(client.open(), Err(ClientError::Config { .. })));
        assert_eq!(client.transport().open_count, 0);
    }

    #[test]
    fn test_http_transport_get_without_open_is_not_connected() {
        let transport = HttpTransport::new();
        assert!(matches!(
            transport.get("https://coastalmonitoring.org/observations/waves/20250104093000", &[]),
            Err(ClientError::NotConnected)
        ));
    }

    #[test]
    fn test_http_transport_rejects_header_unsafe_key() {
        let mut transport = HttpTransport::new();
        let headers = SessionHeaders {
            api_key: "line\nbreak".to_string(),
            referer: "https://example.org".to_string(),
        };
        assert!(matches!(
            transport.open(&headers, Duration::from_secs(1)),
            Err(ClientError::Config { .. })
        ));
    }

    #[test]
    fn test_debug_output_hides_credentials() {
        let client = CoastalMonitoringClient::new(ClientConfig::new("k-secret", "https://ref.example"));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("k-secret"));
        assert!(!debug.contains("ref.example"));
    }
}
