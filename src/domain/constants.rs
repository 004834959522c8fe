//! Site characteristics and reference catalog for LSN-Online
//!
//! Fixed facts about the remote statistics application (paths, form values,
//! timing) plus the known region and table identifiers.

/// LSN-Online site characteristics
pub mod site {
    /// Scheme and host every redirect target is resolved against
    pub const HOST_URL: &str = "https://www1.nls.niedersachsen.de";

    /// Root of the statistics application
    pub const BASE_URL: &str = "https://www1.nls.niedersachsen.de/statistik";

    /// Entry page that hands out the initial session cookies
    pub const ENTRY_PATH: &str = "default.asp";

    /// Form target for table queries
    pub const QUERY_PATH: &str = "html/mustertabelle.asp";

    /// Parameter page sent as `Referer` (the table id is appended as `?DT=`)
    pub const PARAM_PAGE_PATH: &str = "html/param_haupt.asp";

    /// Browser identity the service expects
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9";

    pub const ACCEPT_LANGUAGE: &str = "de-DE,de;q=0.9";
}

/// Query protocol constants
pub mod query {
    /// Form field and value of the "continue" button on the entry page
    pub const SESSION_FIELD: &str = "LOGIN1";
    pub const SESSION_VALUE: &str = "WEITER";

    /// Fixed value of the `LN2` form field
    pub const SECONDARY_LEVEL: &str = "9";

    /// Length of the short key used as range bound
    pub const SHORT_KEY_LEN: usize = 6;

    /// Minimum wait between query submission and result fetch.
    ///
    /// The result page is generated asynchronously on the server; fetching it
    /// earlier returns an incomplete page.
    pub const RESULT_READY_DELAY_MS: u64 = 2000;

    /// Decimal digits of the `ZUFALL` nonce
    pub const NONCE_DIGITS: usize = 6;
}

/// Known region identifiers (9-digit, zero padded)
pub mod regions {
    pub const NIEDERSACHSEN: &str = "000000000";
    pub const NORDSTEMMEN: &str = "254026000";
    pub const HILDESHEIM_KREIS: &str = "254000000";

    /// All known regions as `(name, id)` pairs
    pub const KNOWN_REGIONS: &[(&str, &str)] = &[
        ("NIEDERSACHSEN", NIEDERSACHSEN),
        ("NORDSTEMMEN", NORDSTEMMEN),
        ("HILDESHEIM_KREIS", HILDESHEIM_KREIS),
    ];
}

/// Known report identifiers
pub mod tables {
    /// Tax revenue, time series
    pub const STEUEREINNAHMEN_ZEITREIHE: &str = "Z9200001";
    /// Tax revenue, single year
    pub const STEUEREINNAHMEN_EINZELJAHR: &str = "K9200001";
    /// Tax capacity, time series
    pub const STEUERKRAFT_ZEITREIHE: &str = "Z9200002";
    /// Tax capacity, single year
    pub const STEUERKRAFT_EINZELJAHR: &str = "K9200002";

    /// All known tables as `(name, id)` pairs
    pub const KNOWN_TABLES: &[(&str, &str)] = &[
        ("STEUEREINNAHMEN_ZEITREIHE", STEUEREINNAHMEN_ZEITREIHE),
        ("STEUEREINNAHMEN_EINZELJAHR", STEUEREINNAHMEN_EINZELJAHR),
        ("STEUERKRAFT_ZEITREIHE", STEUERKRAFT_ZEITREIHE),
        ("STEUERKRAFT_EINZELJAHR", STEUERKRAFT_EINZELJAHR),
    ];
}

/// Placeholder name when the result page carries no region header
pub const UNKNOWN_REGION_NAME: &str = "Unknown";
