//! HTTP requests executed by the host.
//!
//! A [`Request`] is sent at most once: [`Request::send`] consumes it and
//! returns a [`Response`], whose body readers consume the response in turn.
//! Both release the host request when dropped.
//!
//! ```compile_fail
//! # use quill_sdk::net::Request;
//! # fn main() -> Result<(), quill_sdk::SysError> {
//! let response = Request::get("https://example.com/")?.send()?;
//! let body = response.text()?;
//! let again = response.data()?;
//! # Ok(())
//! # }
//! ```

use quill_sys::*;

use crate::html::Node;
use crate::{SysError, ValueRef, utf8};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    fn code(self) -> i32 {
        match self {
            Self::Get => 0,
            Self::Post => 1,
            Self::Put => 2,
            Self::Delete => 3,
            Self::Head => 4,
        }
    }
}

/// Settings applied when a request is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// An unsent request.
#[derive(Debug)]
pub struct Request {
    handle: Handle,
}

impl Request {
    pub fn new(method: HttpMethod) -> Result<Self, SysError> {
        let handle = unsafe { quill_net_init(method.code())? };
        Ok(Self { handle })
    }

    pub fn with_options(method: HttpMethod, options: RequestOptions) -> Result<Self, SysError> {
        let mut request = Self::new(method)?;
        if let Some(url) = &options.url {
            request.set_url(url)?;
        }
        request.set_headers(options.headers)?;
        if let Some(body) = &options.body {
            request.set_body(body)?;
        }
        Ok(request)
    }

    pub fn get(url: impl AsRef<str>) -> Result<Self, SysError> {
        let mut request = Self::new(HttpMethod::Get)?;
        request.set_url(url)?;
        Ok(request)
    }

    pub fn post(url: impl AsRef<str>) -> Result<Self, SysError> {
        let mut request = Self::new(HttpMethod::Post)?;
        request.set_url(url)?;
        Ok(request)
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn set_url(&mut self, url: impl AsRef<str>) -> Result<(), SysError> {
        unsafe { quill_net_set_url(self.handle, url.as_ref().as_bytes().to_vec())? };
        Ok(())
    }

    /// The URL as set, or empty.
    pub fn url(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_net_get_url(self.handle)? })
    }

    /// Sets a header; a later value for the same name replaces the earlier one.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<(), SysError> {
        unsafe {
            quill_net_set_header(
                self.handle,
                name.as_ref().as_bytes().to_vec(),
                value.as_ref().as_bytes().to_vec(),
            )?
        };
        Ok(())
    }

    pub fn set_headers<I, K, V>(&mut self, headers: I) -> Result<(), SysError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self.set_header(name, value)?;
        }
        Ok(())
    }

    pub fn set_body(&mut self, body: impl AsRef<[u8]>) -> Result<(), SysError> {
        unsafe { quill_net_set_body(self.handle, body.as_ref().to_vec())? };
        Ok(())
    }

    /// Transmits the request. HTTP error statuses are ordinary responses;
    /// an unreachable host or invalid URL is an error.
    pub fn send(self) -> Result<Response, SysError> {
        unsafe { quill_net_send(self.handle)? };
        let handle = self.handle;
        std::mem::forget(self);
        Ok(Response { handle })
    }

    pub fn data(self) -> Result<Vec<u8>, SysError> {
        self.send()?.data()
    }

    pub fn string(self) -> Result<String, SysError> {
        self.send()?.text()
    }

    pub fn json(self) -> Result<ValueRef, SysError> {
        self.send()?.json()
    }

    pub fn html(self) -> Result<Node, SysError> {
        self.send()?.html()
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        let _ = unsafe { quill_net_close(self.handle) };
    }
}

/// A sent request and its response.
#[derive(Debug)]
pub struct Response {
    handle: Handle,
}

impl Response {
    pub fn status_code(&self) -> Result<i32, SysError> {
        Ok(unsafe { quill_net_get_status_code(self.handle)? })
    }

    /// Response header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Result<Option<String>, SysError> {
        let value = ValueRef::from_handle(unsafe {
            quill_net_get_header(self.handle, name.as_bytes().to_vec())?
        })?;
        if value.is_string() {
            value.as_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn url(&self) -> Result<String, SysError> {
        utf8(unsafe { quill_net_get_url(self.handle)? })
    }

    /// Body length in bytes.
    pub fn len(&self) -> Result<usize, SysError> {
        Ok(unsafe { quill_net_get_data_size(self.handle)? } as usize)
    }

    pub fn is_empty(&self) -> Result<bool, SysError> {
        Ok(self.len()? == 0)
    }

    pub fn data(self) -> Result<Vec<u8>, SysError> {
        Ok(unsafe { quill_net_get_data(self.handle)? })
    }

    pub fn text(self) -> Result<String, SysError> {
        utf8(self.data()?)
    }

    /// Body parsed as JSON; invalid JSON gives a Null value.
    pub fn json(self) -> Result<ValueRef, SysError> {
        ValueRef::from_handle(unsafe { quill_net_json(self.handle)? })
    }

    /// Body parsed as HTML, with the request URL as base URI.
    pub fn html(self) -> Result<Node, SysError> {
        let value = ValueRef::from_handle(unsafe { quill_net_html(self.handle)? })?;
        Node::from_value(value)
            .ok_or_else(|| SysError::ApiError("host returned a non-node document".into()))
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        let _ = unsafe { quill_net_close(self.handle) };
    }
}

/// Caps requests at `requests` per window. Zero removes the cap.
pub fn set_rate_limit(requests: i32) -> Result<(), SysError> {
    unsafe { quill_net_set_rate_limit(requests)? };
    Ok(())
}

/// Window length in seconds; 60 unless set.
pub fn set_rate_limit_period(seconds: i32) -> Result<(), SysError> {
    unsafe { quill_net_set_rate_limit_period(seconds)? };
    Ok(())
}

/// Request throttle for the rest of the session. The last one applied wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: i32,
    pub period_secs: i32,
}

impl RateLimit {
    #[must_use]
    pub fn new(requests: i32, period_secs: i32) -> Self {
        Self {
            requests,
            period_secs,
        }
    }

    pub fn apply(self) -> Result<(), SysError> {
        set_rate_limit(self.requests)?;
        set_rate_limit_period(self.period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_host::net::{HttpResponse, SentLog, StaticTransport};

    const CHAPTERS: &str = "https://example.com/api/chapters";
    const PAGE: &str = "https://example.com/manga/one";

    fn install() -> SentLog {
        let transport = StaticTransport::new()
            .route(
                CHAPTERS,
                HttpResponse::new(200, r#"{"chapters": [{"id": "c1"}, {"id": "c2"}]}"#)
                    .with_header("Content-Type", "application/json"),
            )
            .route(PAGE, HttpResponse::new(200, r#"<a class="next" href="two">next</a>"#))
            .route("https://example.com/missing", HttpResponse::new(404, "not found"));
        let log = transport.sent_log();
        quill_host::install_transport(transport);
        log
    }

    fn live_handles() -> usize {
        quill_host::with_session(|s| s.live_handles())
    }

    #[test]
    fn get_string_sends_exactly_once() {
        let log = install();
        let before = live_handles();
        let body = Request::get(PAGE).unwrap().string().unwrap();
        assert!(body.contains("next"));
        assert_eq!(log.len(), 1);
        assert_eq!(live_handles(), before);
    }

    #[test]
    fn response_metadata_does_not_consume() {
        let _log = install();
        let response = Request::get(CHAPTERS).unwrap().send().unwrap();
        assert_eq!(response.status_code().unwrap(), 200);
        assert_eq!(
            response.header("content-type").unwrap().as_deref(),
            Some("application/json")
        );
        assert_eq!(response.header("etag").unwrap(), None);
        assert_eq!(response.url().unwrap(), CHAPTERS);
        assert!(!response.is_empty().unwrap());

        let json = response.json().unwrap();
        let chapters = json.get("chapters").unwrap();
        assert_eq!(chapters.len().unwrap(), 2);
        assert_eq!(chapters.get_at(1).unwrap().get("id").unwrap().as_string().unwrap(), "c2");
    }

    #[test]
    fn html_uses_the_request_url_as_base() {
        let _log = install();
        let doc = Request::get(PAGE).unwrap().html().unwrap();
        assert_eq!(doc.base_uri().unwrap(), PAGE);
        assert_eq!(
            doc.select("a.next").unwrap().attr("abs:href").unwrap(),
            "https://example.com/manga/two"
        );
    }

    #[test]
    fn error_statuses_are_responses() {
        let _log = install();
        let response = Request::get("https://example.com/missing")
            .unwrap()
            .send()
            .unwrap();
        assert_eq!(response.status_code().unwrap(), 404);
        assert_eq!(response.text().unwrap(), "not found");
    }

    #[test]
    fn unreachable_hosts_fail_the_send() {
        let log = install();
        let before = live_handles();
        let result = Request::get("https://unknown.example.org/").unwrap().send();
        assert!(matches!(result, Err(SysError::HostError(_))));
        assert_eq!(log.len(), 1);
        assert_eq!(live_handles(), before);

        assert!(Request::get("not a url").unwrap().data().is_err());
    }

    #[test]
    fn options_headers_and_body_are_sent() {
        let log = install();
        let options = RequestOptions::default()
            .with_url(CHAPTERS)
            .with_header("Authorization", "Bearer one")
            .with_body(br#"{"page": 1}"#.to_vec());
        let mut request = Request::with_options(HttpMethod::Post, options).unwrap();
        request
            .set_headers([("authorization", "Bearer two"), ("Accept", "application/json")])
            .unwrap();
        assert_eq!(request.url().unwrap(), CHAPTERS);
        request.data().unwrap();

        let sent = &log.requests()[0];
        assert_eq!(sent.header("Authorization"), Some("Bearer two"));
        assert_eq!(sent.header("accept"), Some("application/json"));
        assert_eq!(sent.body.as_deref(), Some(&br#"{"page": 1}"#[..]));
    }

    #[test]
    fn dropping_unsent_requests_releases_them() {
        let before = live_handles();
        let mut request = Request::post("https://example.com/").unwrap();
        request.set_body("x").unwrap();
        drop(request);
        assert_eq!(live_handles(), before);
    }

    #[test]
    fn rate_limit_is_applied_to_the_session() {
        RateLimit::new(5, 10).apply().unwrap();
        let limit = quill_host::with_session(|s| s.rate_limit());
        assert_eq!(
            limit,
            Some(quill_host::RateLimitConfig {
                requests: 5,
                period_secs: 10
            })
        );

        set_rate_limit(0).unwrap();
        assert_eq!(quill_host::with_session(|s| s.rate_limit()), None);
    }

    #[test]
    fn period_may_be_set_before_the_count() {
        set_rate_limit_period(10).unwrap();
        set_rate_limit(5).unwrap();
        let limit = quill_host::with_session(|s| s.rate_limit()).unwrap();
        assert_eq!((limit.requests, limit.period_secs), (5, 10));
    }
}
