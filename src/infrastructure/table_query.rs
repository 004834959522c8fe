//! Table query submission
//!
//! A query is a classic form post to `mustertabelle.asp`. The service answers
//! with a meta-refresh page whose `url='...'` points at the result page, which
//! is generated asynchronously and only complete after a short wait.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use super::config::QueryConfig;
use super::error::{LsnError, LsnResult};
use super::http_session::HttpSession;
use crate::domain::constants::{query, site};
use crate::domain::region::short_key;
use crate::domain::table::TableQuery;

const REDIRECT_PATTERN: &str = r"(?i)url='([^']+)'";

/// Wait abstraction so tests do not sleep for real
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Builds, posts and resolves table queries
pub struct TableQuerySubmitter {
    session: Arc<HttpSession>,
    host_url: Url,
    config: QueryConfig,
    sleeper: Arc<dyn Sleeper>,
    redirect: Regex,
}

impl TableQuerySubmitter {
    pub fn new(session: Arc<HttpSession>, config: QueryConfig) -> LsnResult<Self> {
        let host_url = Url::parse(&session.config().host_url)?;
        let redirect = Regex::new(REDIRECT_PATTERN)
            .map_err(|e| LsnError::configuration(format!("redirect pattern: {e}")))?;

        Ok(Self {
            session,
            host_url,
            config,
            sleeper: Arc::new(TokioSleeper),
            redirect,
        })
    }

    /// Replace the wait implementation (the duration itself stays the same)
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn session(&self) -> &Arc<HttpSession> {
        &self.session
    }

    /// Wait between submission and result fetch; never below the site minimum
    pub fn result_delay(&self) -> Duration {
        self.config
            .result_delay()
            .max(Duration::from_millis(query::RESULT_READY_DELAY_MS))
    }

    /// Cache-busting `ZUFALL` value, e.g. `0.482913`
    pub fn nonce() -> String {
        format!("{:.*}", query::NONCE_DIGITS, fastrand::f64())
    }

    /// Form fields in the order the browser sends them
    pub fn build_form(&self, query: &TableQuery, nonce: &str) -> Vec<(&'static str, String)> {
        let key = short_key(&query.region_id);
        vec![
            ("DT", query.table_id.clone()),
            ("ZUFALL", nonce.to_string()),
            ("UG", query.region_id.clone()),
            ("LN", query.level.as_param().to_string()),
            ("LN2", self.config.secondary_level.clone()),
            ("RANGE0", key.clone()),
            ("RANGE1", key),
            ("TEXTSORT", String::new()),
        ]
    }

    pub fn encode_form(fields: &[(&str, String)]) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().map(|(k, v)| (*k, v.as_str())))
            .finish()
    }

    /// Parameter page of the report, sent as `Referer`
    pub fn referer(&self, table_id: &str) -> LsnResult<Url> {
        let mut url = self.session.url(site::PARAM_PAGE_PATH)?;
        url.query_pairs_mut().append_pair("DT", table_id);
        Ok(url)
    }

    /// Redirect target embedded in the submission response
    pub fn extract_redirect(&self, body: &str) -> Option<String> {
        self.redirect
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().replace("&amp;", "&"))
    }

    /// Submit a query and return the raw result page.
    pub async fn submit_query(&self, query: &TableQuery) -> LsnResult<String> {
        self.submit_query_with_cancellation(query, &CancellationToken::new())
            .await
    }

    /// Same as [`submit_query`](Self::submit_query); cancelling the token
    /// aborts the result-ready wait with [`LsnError::Cancelled`].
    pub async fn submit_query_with_cancellation(
        &self,
        query: &TableQuery,
        cancellation_token: &CancellationToken,
    ) -> LsnResult<String> {
        if !self.session.ensure_session().await {
            return Err(LsnError::session("handshake did not complete"));
        }

        let form = self.build_form(query, &Self::nonce());
        let query_url = self.session.url(site::QUERY_PATH)?;
        let referer = self.referer(&query.table_id)?;

        info!(
            "📤 Submitting table {} for region {} (level {})",
            query.table_id, query.region_id, query.level
        );
        let response = self
            .session
            .post_form(query_url.clone(), Self::encode_form(&form), Some(&referer))
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LsnError::HttpStatus {
                status: status.as_u16(),
                url: query_url.to_string(),
            });
        }

        let Some(redirect) = self.extract_redirect(&body) else {
            warn!("No redirect URL found for table {}", query.table_id);
            return Err(LsnError::no_redirect(&query.table_id));
        };
        let result_url = self.host_url.join(&redirect)?;

        let delay = self.result_delay();
        debug!("Waiting {:?} for result page {}", delay, result_url);
        tokio::select! {
            () = self.sleeper.sleep(delay) => {}
            () = cancellation_token.cancelled() => {
                warn!("🛑 Query for table {} cancelled", query.table_id);
                return Err(LsnError::Cancelled);
            }
        }

        let response = self.session.get(result_url.clone()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LsnError::HttpStatus {
                status: status.as_u16(),
                url: result_url.to_string(),
            });
        }
        let html = response.text().await?;
        debug!("Fetched result page ({} chars)", html.len());
        Ok(html)
    }
}
