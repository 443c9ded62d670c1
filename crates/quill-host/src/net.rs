//! HTTP requests, transports and rate limiting.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::rc::Rc;
use std::time::{Duration, Instant};

use url::Url;

use crate::config::{DEFAULT_RATE_LIMIT_PERIOD_SECS, HostConfig, RateLimitConfig};
use crate::error::{HostError, HostResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    /// Decodes the method code sent by the guest.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnsupportedMethod`] for unknown codes.
    pub fn from_code(code: i32) -> HostResult<Self> {
        match code {
            0 => Ok(Self::Get),
            1 => Ok(Self::Post),
            2 => Ok(Self::Put),
            3 => Ok(Self::Delete),
            4 => Ok(Self::Head),
            other => Err(HostError::UnsupportedMethod(other)),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

/// A fully assembled request, handed to the [`Transport`].
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl OutboundRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends requests on behalf of the guest.
pub trait Transport {
    /// Performs the request. HTTP error statuses are responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Transport`] if no response could be obtained.
    fn execute(&self, request: &OutboundRequest) -> HostResult<HttpResponse>;
}

/// Blocking `reqwest` transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    max_payload_len: u64,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns [`HostError::Transport`] if the client cannot be built.
    pub fn new(config: &HostConfig) -> HostResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HostError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            max_payload_len: config.max_payload_len,
        })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &OutboundRequest) -> HostResult<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        };
        let mut builder = self
            .client
            .request(method, request.url.clone())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .map_err(|e| HostError::Transport(format!("http request failed: {e}")))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        let mut body = Vec::new();
        response
            .take(self.max_payload_len.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| HostError::Transport(format!("failed to read response body: {e}")))?;
        if body.len() as u64 > self.max_payload_len {
            return Err(HostError::Transport(format!(
                "response exceeded maximum payload limit ({} bytes)",
                self.max_payload_len
            )));
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Requests seen by a [`StaticTransport`], shared with the test that installed it.
#[derive(Debug, Clone, Default)]
pub struct SentLog(Rc<RefCell<Vec<OutboundRequest>>>);

impl SentLog {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.0.borrow().clone()
    }
}

/// Serves canned responses by URL. Unknown URLs fail like an unreachable host.
#[derive(Debug, Default)]
pub struct StaticTransport {
    routes: HashMap<String, HttpResponse>,
    sent: SentLog,
}

impl StaticTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.insert(url.into(), response);
        self
    }

    /// Handle onto the log of requests this transport executes.
    #[must_use]
    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }
}

impl Transport for StaticTransport {
    fn execute(&self, request: &OutboundRequest) -> HostResult<HttpResponse> {
        self.sent.0.borrow_mut().push(request.clone());
        self.routes
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| HostError::Transport(format!("no route to {}", request.url)))
    }
}

/// Guest-side state of one request handle.
#[derive(Debug)]
pub(crate) struct RequestState {
    pub(crate) method: HttpMethod,
    pub(crate) url: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) response: Option<HttpResponse>,
}

impl RequestState {
    pub(crate) fn new(method: HttpMethod) -> Self {
        Self {
            method,
            url: None,
            headers: Vec::new(),
            body: None,
            response: None,
        }
    }

    /// Later values replace earlier ones with the same (case-insensitive) name.
    pub(crate) fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => value.clone_into(&mut entry.1),
            None => self.headers.push((name.to_owned(), value.to_owned())),
        }
    }

    pub(crate) fn outbound(&self, config: &HostConfig) -> HostResult<OutboundRequest> {
        let raw = self.url.as_deref().unwrap_or_default();
        let url = Url::parse(raw).map_err(|e| HostError::InvalidUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;
        let mut headers = self.headers.clone();
        if find_header(&headers, "user-agent").is_none() {
            headers.push(("User-Agent".to_owned(), config.user_agent.clone()));
        }
        Ok(OutboundRequest {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
            timeout: config.timeout(),
        })
    }
}

/// Sliding-window throttle over all requests of a session.
///
/// Count and period are set independently; the last write to either wins.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    /// `None` leaves sends unthrottled.
    requests: Option<u32>,
    period_secs: u32,
    sent: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RateLimiter {
    pub(crate) fn new(limit: Option<RateLimitConfig>) -> Self {
        Self {
            requests: limit.map(|l| l.requests).filter(|n| *n > 0),
            period_secs: limit.map_or(DEFAULT_RATE_LIMIT_PERIOD_SECS, |l| l.period_secs),
            sent: VecDeque::new(),
        }
    }

    /// The active throttle. `None` when no positive count is set.
    pub(crate) fn limit(&self) -> Option<RateLimitConfig> {
        self.requests.map(|requests| RateLimitConfig {
            requests,
            period_secs: self.period_secs,
        })
    }

    /// A non-positive count disables throttling. The period is kept.
    pub(crate) fn set_requests(&mut self, requests: i32) {
        self.requests = u32::try_from(requests).ok().filter(|n| *n > 0);
    }

    /// Negative values are treated as zero, which disables throttling.
    pub(crate) fn set_period(&mut self, seconds: i32) {
        self.period_secs = u32::try_from(seconds).unwrap_or(0);
    }

    /// Records a send at `now`, or reports how long until one is allowed.
    ///
    /// The reported wait is never zero.
    pub(crate) fn try_acquire_at(&mut self, now: Instant) -> Result<(), Duration> {
        let Some(requests) = self.requests.filter(|n| *n > 0) else {
            return Ok(());
        };
        if self.period_secs == 0 {
            return Ok(());
        }
        let window = Duration::from_secs(u64::from(self.period_secs));
        while self
            .sent
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            self.sent.pop_front();
        }
        if self.sent.len() >= requests as usize {
            let oldest = self.sent.front().copied().unwrap_or(now);
            let wait = window.saturating_sub(now.saturating_duration_since(oldest));
            return Err(wait.max(Duration::from_millis(1)));
        }
        self.sent.push_back(now);
        Ok(())
    }

    /// Blocks until the window has room, then records the send.
    pub(crate) fn acquire(&mut self) {
        loop {
            match self.try_acquire_at(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    tracing::warn!(?wait, "rate limit reached, delaying request");
                    std::thread::sleep(wait);
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_codes_round_trip() {
        assert_eq!(HttpMethod::from_code(0).unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::from_code(4).unwrap().as_str(), "HEAD");
        assert!(matches!(
            HttpMethod::from_code(9),
            Err(HostError::UnsupportedMethod(9))
        ));
    }

    #[test]
    fn later_headers_overwrite() {
        let mut request = RequestState::new(HttpMethod::Get);
        request.set_header("Accept", "text/html");
        request.set_header("accept", "application/json");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers[0].1, "application/json");
    }

    #[test]
    fn outbound_adds_user_agent_once() {
        let config = HostConfig::default();
        let mut request = RequestState::new(HttpMethod::Get);
        request.url = Some("https://example.com/".into());
        let outbound = request.outbound(&config).unwrap();
        assert_eq!(outbound.header("USER-AGENT"), Some(config.user_agent.as_str()));

        request.set_header("User-Agent", "custom");
        let outbound = request.outbound(&config).unwrap();
        assert_eq!(outbound.header("user-agent"), Some("custom"));
        assert_eq!(outbound.headers.len(), 1);
    }

    #[test]
    fn outbound_requires_a_valid_url() {
        let request = RequestState::new(HttpMethod::Get);
        assert!(matches!(
            request.outbound(&HostConfig::default()),
            Err(HostError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn static_transport_logs_and_routes() {
        let transport =
            StaticTransport::new().route("https://example.com/", HttpResponse::new(200, "ok"));
        let log = transport.sent_log();
        let mut request = RequestState::new(HttpMethod::Get);
        request.url = Some("https://example.com/".into());
        let outbound = request.outbound(&HostConfig::default()).unwrap();
        assert_eq!(transport.execute(&outbound).unwrap().body, b"ok");
        assert_eq!(log.len(), 1);

        request.url = Some("https://example.com/missing".into());
        let outbound = request.outbound(&HostConfig::default()).unwrap();
        assert!(matches!(
            transport.execute(&outbound),
            Err(HostError::Transport(_))
        ));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn unlimited_by_default() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.try_acquire_at(now).is_ok());
        }
    }

    #[test]
    fn window_blocks_then_frees() {
        let mut limiter = RateLimiter::default();
        limiter.set_requests(2);
        limiter.set_period(10);
        let start = Instant::now();
        assert!(limiter.try_acquire_at(start).is_ok());
        assert!(limiter.try_acquire_at(start + Duration::from_secs(1)).is_ok());

        let wait = limiter
            .try_acquire_at(start + Duration::from_secs(2))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(8));

        assert!(limiter.try_acquire_at(start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn period_survives_count_changes() {
        let mut limiter = RateLimiter::default();
        limiter.set_period(10);
        assert!(limiter.limit().is_none());
        limiter.set_requests(5);
        assert_eq!(
            limiter.limit(),
            Some(RateLimitConfig {
                requests: 5,
                period_secs: 10
            })
        );

        limiter.set_requests(0);
        assert!(limiter.limit().is_none());
        limiter.set_requests(3);
        assert_eq!(limiter.limit().map(|l| l.period_secs), Some(10));
    }

    #[test]
    fn last_write_wins() {
        let mut limiter = RateLimiter::default();
        limiter.set_requests(3);
        limiter.set_period(5);
        limiter.set_requests(4);
        limiter.set_period(7);
        assert_eq!(
            limiter.limit(),
            Some(RateLimitConfig {
                requests: 4,
                period_secs: 7
            })
        );
    }

    #[test]
    fn count_without_period_uses_default_window() {
        let mut limiter = RateLimiter::default();
        limiter.set_requests(1);
        let start = Instant::now();
        assert!(limiter.try_acquire_at(start).is_ok());
        let wait = limiter.try_acquire_at(start).unwrap_err();
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn delayed_send_goes_through_once_the_window_slides() {
        let mut limiter = RateLimiter::default();
        limiter.set_requests(1);
        limiter.set_period(3);
        let start = Instant::now();
        assert!(limiter.try_acquire_at(start).is_ok());

        let wait = limiter
            .try_acquire_at(start + Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(wait, Duration::from_secs(2));
        assert!(
            limiter
                .try_acquire_at(start + Duration::from_secs(2))
                .is_err()
        );

        let retry = start + Duration::from_secs(1) + wait;
        assert!(limiter.try_acquire_at(retry).is_ok());
        assert!(limiter.try_acquire_at(retry).is_err());
    }

    #[test]
    fn non_positive_counts_disable_throttling() {
        for requests in [0, -1, i32::MIN] {
            let mut limiter = RateLimiter::default();
            limiter.set_requests(requests);
            let now = Instant::now();
            for _ in 0..10 {
                assert!(limiter.try_acquire_at(now).is_ok());
            }
        }
    }

    #[test]
    fn zero_or_negative_periods_never_block() {
        for period in [0, -5] {
            let mut limiter = RateLimiter::default();
            limiter.set_requests(1);
            limiter.set_period(period);
            assert_eq!(limiter.limit().map(|l| l.period_secs), Some(0));
            let now = Instant::now();
            for _ in 0..10 {
                assert!(limiter.try_acquire_at(now).is_ok());
            }
        }
    }

    #[test]
    fn zero_count_from_config_never_blocks() {
        let config =
            HostConfig::from_toml_str("[rate_limit]\nrequests = 0\nperiod_secs = 0\n").unwrap();
        let mut limiter = RateLimiter::new(config.rate_limit);
        assert!(limiter.limit().is_none());
        let now = Instant::now();
        for _ in 0..10 {
            assert!(limiter.try_acquire_at(now).is_ok());
        }
        limiter.acquire();

        let config =
            HostConfig::from_toml_str("[rate_limit]\nrequests = 2\nperiod_secs = 0\n").unwrap();
        let mut limiter = RateLimiter::new(config.rate_limit);
        for _ in 0..10 {
            limiter.acquire();
        }
    }
}
