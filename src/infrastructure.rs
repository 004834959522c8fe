//! Infrastructure layer: configuration, logging, HTTP session handling,
//! query submission and result page parsing.

pub mod config;
pub mod error;
pub mod export;
pub mod http_session;
pub mod logging;
pub mod number_format;
pub mod result_parser;
pub mod table_query;

pub use config::{ConfigError, HttpConfig, LoggingConfig, LsnConfig, QueryConfig};
pub use error::{ErrorCategory, LsnError, LsnResult, NumberFormatError, ParsingError};
pub use export::ExportFormat;
pub use http_session::{HttpSession, SessionState};
pub use number_format::{parse_amount, parse_nullable_amount};
pub use result_parser::{ParseReport, ResultPageParser, ResultParser};
pub use table_query::{Sleeper, TableQuerySubmitter, TokioSleeper};
