//! HTTP request calls.

use super::{Resource, Session, utf8};
use crate::error::{HostError, HostResult};
use crate::net::{HttpMethod, HttpResponse, RequestState};
use crate::value::Value;

impl Session {
    /// # Errors
    ///
    /// Fails for unknown method codes.
    pub fn net_init(&mut self, method: i32) -> HostResult<u32> {
        let method = HttpMethod::from_code(method)?;
        let handle = self
            .resources
            .insert(Resource::Request(Box::new(RequestState::new(method))));
        tracing::debug!(handle, method = method.as_str(), "created request");
        Ok(handle)
    }

    /// # Errors
    ///
    /// Fails for unknown, non-request or already sent handles.
    pub fn net_set_url(&mut self, handle: u32, url: &[u8]) -> HostResult<()> {
        let url = utf8(url, "url")?.to_owned();
        self.unsent(handle)?.url = Some(url);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails for unknown, non-request or already sent handles.
    pub fn net_set_header(&mut self, handle: u32, name: &[u8], value: &[u8]) -> HostResult<()> {
        let name = utf8(name, "header name")?;
        let value = utf8(value, "header value")?;
        self.unsent(handle)?.set_header(name, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails for unknown, non-request or already sent handles.
    pub fn net_set_body(&mut self, handle: u32, body: &[u8]) -> HostResult<()> {
        self.unsent(handle)?.body = Some(body.to_vec());
        Ok(())
    }

    /// Sends the request, waiting for the rate limit if one is set.
    ///
    /// # Errors
    ///
    /// Fails if the request was already sent, has no valid URL, or the
    /// transport cannot produce a response.
    pub fn net_send(&mut self, handle: u32) -> HostResult<()> {
        let outbound = {
            let request = self.request_ref(handle)?;
            if request.response.is_some() {
                return Err(HostError::AlreadySent(handle));
            }
            request.outbound(&self.config)?
        };

        self.limiter.acquire();
        tracing::info!(
            handle,
            method = outbound.method.as_str(),
            url = %outbound.url,
            "sending request"
        );
        let response = self.transport()?.execute(&outbound)?;
        tracing::debug!(
            handle,
            status = response.status,
            len = response.body.len(),
            "received response"
        );
        self.request(handle)?.response = Some(response);
        Ok(())
    }

    /// The URL as set by the guest, or empty.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-request handles.
    pub fn net_get_url(&self, handle: u32) -> HostResult<Vec<u8>> {
        let request = self.request_ref(handle)?;
        Ok(request.url.clone().unwrap_or_default().into_bytes())
    }

    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_get_data(&self, handle: u32) -> HostResult<Vec<u8>> {
        Ok(self.response(handle)?.body.clone())
    }

    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_get_data_size(&self, handle: u32) -> HostResult<u32> {
        let len = self.response(handle)?.body.len();
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_get_status_code(&self, handle: u32) -> HostResult<i32> {
        Ok(i32::from(self.response(handle)?.status))
    }

    /// String value of a response header, or Null when absent.
    ///
    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_get_header(&mut self, handle: u32, name: &[u8]) -> HostResult<u32> {
        let name = utf8(name, "header name")?;
        let value = self.response(handle)?.header(name).map(str::to_owned);
        Ok(self.alloc(value.map_or(Value::Null, Value::String)))
    }

    /// Parses the response body as JSON.
    ///
    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_json(&mut self, handle: u32) -> HostResult<u32> {
        let body = self.response(handle)?.body.clone();
        self.json_parse(&body)
    }

    /// Parses the response body as HTML, using the request URL as base URI.
    ///
    /// # Errors
    ///
    /// Fails unless the request has been sent.
    pub fn net_html(&mut self, handle: u32) -> HostResult<u32> {
        let body = self.response(handle)?.body.clone();
        let url = self.net_get_url(handle)?;
        self.parse_html(&body, &url, false)
    }

    /// Releases a request handle.
    ///
    /// # Errors
    ///
    /// Fails for unknown or non-request handles.
    pub fn net_close(&mut self, handle: u32) -> HostResult<()> {
        self.request_ref(handle)?;
        self.release(handle)
    }

    /// Requests allowed per period. Zero or less removes the limit.
    pub fn net_set_rate_limit(&mut self, requests: i32) {
        self.limiter.set_requests(requests);
        tracing::debug!(limit = ?self.limiter.limit(), "rate limit updated");
    }

    /// Length of the rate limit window in seconds.
    pub fn net_set_rate_limit_period(&mut self, seconds: i32) {
        self.limiter.set_period(seconds);
        tracing::debug!(limit = ?self.limiter.limit(), "rate limit updated");
    }

    fn request_ref(&self, handle: u32) -> HostResult<&RequestState> {
        match self.resources.get(handle)? {
            Resource::Request(request) => Ok(request.as_ref()),
            Resource::Value(_) => Err(HostError::InvalidHandle(handle)),
        }
    }

    fn unsent(&mut self, handle: u32) -> HostResult<&mut RequestState> {
        let request = self.request(handle)?;
        if request.response.is_some() {
            return Err(HostError::AlreadySent(handle));
        }
        Ok(request)
    }

    fn response(&self, handle: u32) -> HostResult<&HttpResponse> {
        self.request_ref(handle)?
            .response
            .as_ref()
            .ok_or(HostError::NotSent(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HostConfig, RateLimitConfig};
    use crate::net::{SentLog, StaticTransport};
    use crate::value::Kind;

    const URL: &str = "https://example.com/manga/1";

    fn session(transport: StaticTransport) -> (Session, SentLog) {
        let log = transport.sent_log();
        let mut session = Session::default();
        session.set_transport(Box::new(transport));
        (session, log)
    }

    fn sent_get(session: &mut Session, url: &str) -> u32 {
        let request = session.net_init(0).unwrap();
        session.net_set_url(request, url.as_bytes()).unwrap();
        session.net_send(request).unwrap();
        request
    }

    #[test]
    fn sends_once_and_reads_the_response() {
        let (mut s, log) = session(StaticTransport::new().route(
            URL,
            HttpResponse::new(200, "hello").with_header("Content-Type", "text/plain"),
        ));
        let request = sent_get(&mut s, URL);
        assert_eq!(log.len(), 1);
        assert_eq!(s.net_get_status_code(request).unwrap(), 200);
        assert_eq!(s.net_get_data(request).unwrap(), b"hello");
        assert_eq!(s.net_get_data_size(request).unwrap(), 5);
        assert!(matches!(
            s.net_send(request),
            Err(HostError::AlreadySent(_))
        ));
        assert!(s.net_set_header(request, b"a", b"b").is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn headers_and_body_reach_the_transport() {
        let (mut s, log) = session(StaticTransport::new().route(URL, HttpResponse::new(201, "")));
        let request = s.net_init(1).unwrap();
        s.net_set_url(request, URL.as_bytes()).unwrap();
        s.net_set_header(request, b"X-Token", b"one").unwrap();
        s.net_set_header(request, b"x-token", b"two").unwrap();
        s.net_set_body(request, b"payload").unwrap();
        s.net_send(request).unwrap();

        let sent = &log.requests()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.header("X-Token"), Some("two"));
        assert_eq!(sent.body.as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn reading_before_send_fails() {
        let (mut s, _) = session(StaticTransport::new());
        let request = s.net_init(0).unwrap();
        assert_eq!(s.net_get_url(request).unwrap(), b"");
        assert!(matches!(
            s.net_get_data(request),
            Err(HostError::NotSent(_))
        ));
    }

    #[test]
    fn response_headers_are_values() {
        let (mut s, _) = session(
            StaticTransport::new().route(URL, HttpResponse::new(200, "").with_header("ETag", "abc")),
        );
        let request = sent_get(&mut s, URL);
        let etag = s.net_get_header(request, b"etag").unwrap();
        assert_eq!(s.value_read_string(etag).unwrap(), b"abc");
        let missing = s.net_get_header(request, b"x-missing").unwrap();
        assert_eq!(s.value_type_of(missing).unwrap(), Kind::Null as i32);
    }

    #[test]
    fn json_and_html_views() {
        let (mut s, _) = session(
            StaticTransport::new()
                .route(URL, HttpResponse::new(200, r#"{"title": "One"}"#))
                .route(
                    "https://example.com/page",
                    HttpResponse::new(200, r#"<a href="/next">n</a>"#),
                ),
        );
        let request = sent_get(&mut s, URL);
        let json = s.net_json(request).unwrap();
        let title = s.object_get(json, b"title").unwrap();
        assert_eq!(s.value_read_string(title).unwrap(), b"One");

        let request = sent_get(&mut s, "https://example.com/page");
        let doc = s.net_html(request).unwrap();
        let link = s.html_select(doc, b"a").unwrap();
        assert_eq!(
            s.html_attr(link, b"abs:href").unwrap(),
            b"https://example.com/next"
        );
    }

    #[test]
    fn error_statuses_are_responses() {
        let (mut s, _) = session(StaticTransport::new().route(URL, HttpResponse::new(404, "gone")));
        let request = sent_get(&mut s, URL);
        assert_eq!(s.net_get_status_code(request).unwrap(), 404);
    }

    #[test]
    fn transport_failures_fail_the_send() {
        let (mut s, _) = session(StaticTransport::new());
        let request = s.net_init(0).unwrap();
        s.net_set_url(request, URL.as_bytes()).unwrap();
        assert!(matches!(s.net_send(request), Err(HostError::Transport(_))));

        let no_url = s.net_init(0).unwrap();
        assert!(matches!(s.net_send(no_url), Err(HostError::InvalidUrl { .. })));
    }

    #[test]
    fn close_releases_only_requests() {
        let (mut s, _) = session(StaticTransport::new());
        let request = s.net_init(3).unwrap();
        let value = s.value_create_null();
        assert!(s.net_close(value).is_err());
        s.net_close(request).unwrap();
        assert!(s.net_close(request).is_err());
        assert_eq!(s.live_handles(), 1);
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let mut s = Session::default();
        assert!(matches!(
            s.net_init(42),
            Err(HostError::UnsupportedMethod(42))
        ));
    }

    #[test]
    fn rate_limit_settings_are_independent() {
        let mut s = Session::default();
        s.net_set_rate_limit_period(10);
        assert_eq!(s.rate_limit(), None);
        s.net_set_rate_limit(5);
        assert_eq!(
            s.rate_limit(),
            Some(RateLimitConfig {
                requests: 5,
                period_secs: 10
            })
        );
        s.net_set_rate_limit(0);
        assert_eq!(s.rate_limit(), None);
        s.net_set_rate_limit(2);
        assert_eq!(s.rate_limit().map(|l| l.period_secs), Some(10));
    }

    #[test]
    fn zero_count_config_does_not_hold_sends() {
        let config =
            HostConfig::from_toml_str("[rate_limit]\nrequests = 0\nperiod_secs = 0\n").unwrap();
        let transport = StaticTransport::new().route(URL, HttpResponse::new(200, "ok"));
        let log = transport.sent_log();
        let mut s = Session::new(config);
        s.set_transport(Box::new(transport));
        for _ in 0..3 {
            sent_get(&mut s, URL);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(s.rate_limit(), None);
    }
}
