//! HTTP session for LSN-Online
//!
//! The service tracks its users with classic ASP session cookies and refuses
//! table queries until the "WEITER" button of the entry page was submitted.
//! Cookies are therefore held explicitly here instead of in reqwest's cookie
//! store, so every request carries exactly the `Cookie` header we built.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE,
    USER_AGENT,
};
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use super::config::HttpConfig;
use super::error::{LsnError, LsnResult};
use crate::domain::constants::{query, site};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Cookies (in order of first appearance) and handshake status
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    cookies: IndexMap<String, String>,
    initialized: bool,
    /// Bumped by every reset; a handshake only counts for the generation it started in
    generation: u64,
}

impl SessionState {
    pub fn cookies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// `name=value` pairs joined by `"; "`, or `None` without cookies
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Merge one `Set-Cookie` header value; attributes after the first `;`
    /// (path, expires, ...) are ignored. Returns `false` for unusable values.
    fn merge_set_cookie(&mut self, raw: &str) -> bool {
        let pair = raw.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return false;
        };
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.cookies.insert(name.to_string(), value.trim().to_string());
        true
    }
}

/// Session manager: owns cookie state and request headers.
///
/// Cookie state sits behind a mutex and the handshake behind an async mutex,
/// so a shared session performs at most one handshake at a time.
pub struct HttpSession {
    client: Client,
    config: HttpConfig,
    base_url: Url,
    base_headers: HeaderMap,
    state: Mutex<SessionState>,
    handshake: tokio::sync::Mutex<()>,
}

impl HttpSession {
    /// Create a new, unauthenticated session
    pub fn new(config: HttpConfig) -> LsnResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        // Url::join replaces the last segment unless the base ends with '/'
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;

        let mut base_headers = HeaderMap::new();
        for (name, value) in [
            (USER_AGENT, &config.user_agent),
            (ACCEPT, &config.accept),
            (ACCEPT_LANGUAGE, &config.accept_language),
        ] {
            let value = HeaderValue::from_str(value).map_err(|e| {
                LsnError::configuration(format!("invalid {name} header '{value}': {e}"))
            })?;
            base_headers.insert(name, value);
        }

        Ok(Self {
            client,
            config,
            base_url,
            base_headers,
            state: Mutex::new(SessionState::default()),
            handshake: tokio::sync::Mutex::new(()),
        })
    }

    pub fn with_defaults() -> LsnResult<Self> {
        Self::new(HttpConfig::default())
    }

    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current session state
    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Resolve a path below the application root
    pub fn url(&self, path: &str) -> LsnResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Drop all cookies and require a new handshake
    pub fn reset(&self) {
        let mut state = self.state();
        state.cookies.clear();
        state.initialized = false;
        state.generation = state.generation.wrapping_add(1);
        debug!("Session state reset (generation {})", state.generation);
    }

    /// Make sure the session handshake has completed.
    ///
    /// Never fails: network errors are logged and reported as `false` so the
    /// caller can retry or give up. Calls on an initialized session are no-ops.
    /// A handshake overlapped by [`reset`](Self::reset) is discarded and
    /// reported as `false`.
    pub async fn ensure_session(&self) -> bool {
        if self.is_initialized() {
            return true;
        }

        let _handshake = self.handshake.lock().await;
        // Another caller may have finished the handshake while we waited
        if self.is_initialized() {
            return true;
        }

        let generation = self.state().generation;
        match self.perform_handshake().await {
            Ok(()) => {
                let mut state = self.state();
                if state.generation != generation {
                    // Cookies of the stale handshake must not leak into the next one
                    state.cookies.clear();
                    warn!("Session was reset during handshake, discarding it");
                    return false;
                }
                state.initialized = true;
                drop(state);
                info!("🔑 LSN session initialized");
                true
            }
            Err(e) => {
                warn!("Session init failed: {}", e);
                false
            }
        }
    }

    async fn perform_handshake(&self) -> LsnResult<()> {
        let entry_url = self.url(site::ENTRY_PATH)?;

        debug!("Loading entry page: {}", entry_url);
        let entry = self.get(entry_url.clone()).await?;
        if !entry.status().is_success() {
            warn!("Entry page returned status {}", entry.status());
        }

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair(query::SESSION_FIELD, query::SESSION_VALUE)
            .finish();
        let response = self.post_form(entry_url, body, None).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LsnError::session(format!("handshake returned status {status}")));
        }
        Ok(())
    }

    /// Headers for every request: browser identity, language negotiation
    /// and, once cookies were received, the combined `Cookie` header.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = self.base_headers.clone();

        if let Some(cookie) = self.state().cookie_header() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => warn!("Dropping unencodable Cookie header: {}", e),
            }
        }
        headers
    }

    /// Merge every `Set-Cookie` pair of a response into the session
    /// (last write wins). Returns the number of pairs recorded.
    pub fn record_cookies(&self, headers: &HeaderMap) -> usize {
        let mut state = self.state();
        let mut recorded = 0;

        for raw in headers.get_all(SET_COOKIE) {
            match raw.to_str() {
                Ok(raw) if state.merge_set_cookie(raw) => recorded += 1,
                Ok(raw) => debug!("Ignoring Set-Cookie without name=value: {}", raw),
                Err(_) => debug!("Ignoring non-ASCII Set-Cookie header"),
            }
        }

        if recorded > 0 {
            debug!("Recorded {} cookie(s), {} held", recorded, state.cookies.len());
        }
        recorded
    }

    /// GET with session headers; cookies of the response are recorded
    pub async fn get(&self, url: Url) -> LsnResult<Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).headers(self.headers()).send().await?;
        self.record_cookies(response.headers());
        Ok(response)
    }

    /// POST an URL-encoded form body; cookies of the response are recorded
    pub async fn post_form(
        &self,
        url: Url,
        body: String,
        referer: Option<&Url>,
    ) -> LsnResult<Response> {
        debug!("POST {}", url);
        let mut headers = self.headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        if let Some(referer) = referer {
            match HeaderValue::from_str(referer.as_str()) {
                Ok(value) => {
                    headers.insert(REFERER, value);
                }
                Err(e) => warn!("Skipping Referer header: {}", e),
            }
        }

        let response = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;
        self.record_cookies(response.headers());
        Ok(response)
    }
}
