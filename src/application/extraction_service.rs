//! Extraction orchestrator
//!
//! One fetch is one full cycle: session check, query submission, result page
//! download and parsing. Failures are logged and collapsed into `None`; callers
//! that need the cause use [`LsnClient::try_fetch_table`].

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::constants::tables;
use crate::domain::region::HierarchyLevel;
use crate::domain::table::{TableQuery, TableResult};
use crate::infrastructure::config::LsnConfig;
use crate::infrastructure::error::{ErrorCategory, LsnResult};
use crate::infrastructure::http_session::HttpSession;
use crate::infrastructure::result_parser::{ResultPageParser, ResultParser};
use crate::infrastructure::table_query::{Sleeper, TableQuerySubmitter};

/// Client for the LSN-Online statistics database.
///
/// Cheap to share behind an `Arc`: the session serializes its own handshake.
pub struct LsnClient {
    submitter: TableQuerySubmitter,
    parser: Arc<dyn ResultParser>,
}

impl LsnClient {
    pub fn new(config: LsnConfig) -> Result<Self> {
        let session =
            HttpSession::new(config.http).context("Failed to create HTTP session")?;
        let submitter = TableQuerySubmitter::new(Arc::new(session), config.query)
            .context("Failed to create query submitter")?;
        let parser = ResultPageParser::new().context("Failed to create result parser")?;

        Ok(Self {
            submitter,
            parser: Arc::new(parser),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(LsnConfig::default())
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.submitter = self.submitter.with_sleeper(sleeper);
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn ResultParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn session(&self) -> &Arc<HttpSession> {
        self.submitter.session()
    }

    /// Drop cookies so the next fetch performs a fresh handshake
    pub fn reset_session(&self) {
        self.session().reset();
    }

    /// Tax revenue time series (`Z9200001`) for one region
    pub async fn fetch_steuereinnahmen(
        &self,
        region_id: &str,
        level: HierarchyLevel,
    ) -> Option<TableResult> {
        self.fetch_table(tables::STEUEREINNAHMEN_ZEITREIHE, region_id, level)
            .await
    }

    /// Best-effort fetch; the cause of a failure is only logged.
    pub async fn fetch_table(
        &self,
        table_id: &str,
        region_id: &str,
        level: HierarchyLevel,
    ) -> Option<TableResult> {
        match self.try_fetch_table(table_id, region_id, level).await {
            Ok(result) => Some(result),
            Err(e) => {
                match e.category() {
                    ErrorCategory::ProtocolDrift | ErrorCategory::Cancelled => {
                        warn!("⚠️ Fetching {} for {} failed: {}", table_id, region_id, e);
                    }
                    _ => error!("❌ Fetching {} for {} failed: {}", table_id, region_id, e),
                }
                None
            }
        }
    }

    pub async fn try_fetch_table(
        &self,
        table_id: &str,
        region_id: &str,
        level: HierarchyLevel,
    ) -> LsnResult<TableResult> {
        self.try_fetch_table_with_cancellation(table_id, region_id, level, &CancellationToken::new())
            .await
    }

    pub async fn try_fetch_table_with_cancellation(
        &self,
        table_id: &str,
        region_id: &str,
        level: HierarchyLevel,
        cancellation_token: &CancellationToken,
    ) -> LsnResult<TableResult> {
        let query = TableQuery::new(table_id, region_id, level);
        let html = self
            .submitter
            .submit_query_with_cancellation(&query, cancellation_token)
            .await?;

        let result = self.parser.parse(&html, table_id, region_id);
        if result.is_empty() {
            warn!("No rows extracted for table {} / region {}", table_id, region_id);
        } else {
            info!(
                "✅ Extracted {} rows for {} ({})",
                result.rows.len(),
                result.region.name,
                result.region.id
            );
        }
        Ok(result)
    }
}
