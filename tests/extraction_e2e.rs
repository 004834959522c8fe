//! End-to-end fetch cycles against a mocked LSN-Online service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lsn_client::infrastructure::table_query::Sleeper;
use lsn_client::{regions, tables, HierarchyLevel, LsnClient, LsnConfig};

const RESULT_PATH: &str = "/statistik/html/tmp/T4711.html";

const RESULT_PAGE: &str = r#"<HTML><HEAD><TITLE>LSN-Online</TITLE></HEAD><BODY>
<TABLE>
<TR><TD class=left COLSPAN=8>254026 Nordstemmen</TD></TR>
<TR><TH>Jahr</TH><TH>Einwohner</TH><TH>Steuereinnahmen</TH><TH>Grundsteuer A</TH>
<TH>Grundsteuer B</TH><TH>Gewerbesteuer</TH><TH>Einkommensteuer</TH><TH>Umsatzsteuer</TH></TR>
<TR class=line1><TD class=left>&nbsp;2021</TD><TD>10.812</TD><TD>11.204.571</TD><TD>94.120</TD><TD>1.587.302</TD><TD>3.998.001</TD><TD>5.102.345</TD><TD>422.803</TD></TR>
<TR class=line2><TD class=left>&nbsp;2022</TD><TD>10.789</TD><TD>11.981.453</TD><TD>95.233</TD><TD>1.598.745</TD><TD>4.123.456</TD><TD>5.456.789</TD><TD>-</TD></TR>
</TABLE></BODY></HTML>"#;

/// Returns immediately; records the requested waits
#[derive(Default)]
struct InstantSleeper {
    waits: std::sync::Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

fn config_for(server: &MockServer) -> LsnConfig {
    let mut config = LsnConfig::default();
    config.http.base_url = format!("{}/statistik", server.uri());
    config.http.host_url = server.uri();
    config.http.timeout_seconds = 5;
    config
}

async fn mount_handshake(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/statistik/default.asp"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "ASPSESSIONIDQA=abc; path=/"),
        )
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/statistik/default.asp"))
        .and(body_string("LOGIN1=WEITER"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "LSNUSER=1"))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_query(server: &MockServer, response_body: &str) {
    Mock::given(method("POST"))
        .and(path("/statistik/html/mustertabelle.asp"))
        .and(header("cookie", "ASPSESSIONIDQA=abc; LSNUSER=1"))
        .and(body_string_contains("DT=Z9200001"))
        .and(body_string_contains("LN=5&LN2=9&RANGE0=254026&RANGE1=254026"))
        .respond_with(ResponseTemplate::new(200).set_body_string(response_body))
        .mount(server)
        .await;
}

fn redirect_page() -> String {
    format!(r#"<META HTTP-EQUIV="REFRESH" CONTENT="0; URL='{RESULT_PATH}'">"#)
}

#[tokio::test]
async fn fetches_tax_revenue_time_series() {
    let server = MockServer::start().await;
    mount_handshake(&server, 1).await;
    mount_query(&server, &redirect_page()).await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .mount(&server)
        .await;

    let sleeper = Arc::new(InstantSleeper::default());
    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(sleeper.clone());

    let result = client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .expect("result");

    assert_eq!(result.table_id, tables::STEUEREINNAHMEN_ZEITREIHE);
    assert_eq!(result.region.id, "254026000");
    assert_eq!(result.region.short_key, "254026");
    assert_eq!(result.region.name, "Nordstemmen");
    assert_eq!(result.years().collect::<Vec<_>>(), vec![2021, 2022]);

    let latest = result.row_for_year(2022).unwrap();
    assert_eq!(latest.population, 10_789.0);
    assert_eq!(latest.trade_tax_net, 4_123_456.0);
    assert_eq!(latest.vat_share, None);
    assert_eq!(result.rows[0].vat_share, Some(422_803.0));

    assert_eq!(*sleeper.waits.lock().unwrap(), vec![Duration::from_millis(2000)]);
}

#[tokio::test]
async fn session_is_reused_across_fetches() {
    let server = MockServer::start().await;
    mount_handshake(&server, 1).await;
    mount_query(&server, &redirect_page()).await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(Arc::new(InstantSleeper::default()));

    for _ in 0..2 {
        assert!(client
            .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
            .await
            .is_some());
    }
}

#[tokio::test]
async fn reset_forces_a_new_handshake() {
    let server = MockServer::start().await;
    mount_handshake(&server, 2).await;
    mount_query(&server, &redirect_page()).await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .mount(&server)
        .await;

    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(Arc::new(InstantSleeper::default()));

    assert!(client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .is_some());
    client.reset_session();
    assert!(!client.session().is_initialized());
    assert!(client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .is_some());
}

#[tokio::test]
async fn missing_redirect_yields_none() {
    let server = MockServer::start().await;
    mount_handshake(&server, 1).await;
    mount_query(&server, "<HTML><BODY>Bitte waehlen Sie eine Tabelle</BODY></HTML>").await;

    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(Arc::new(InstantSleeper::default()));

    assert!(client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .is_none());

    let err = client
        .try_fetch_table(
            tables::STEUEREINNAHMEN_ZEITREIHE,
            regions::NORDSTEMMEN,
            HierarchyLevel::Municipality,
        )
        .await
        .unwrap_err();
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn failed_handshake_yields_none() {
    let server = MockServer::start().await;
    Mock::given(path("/statistik/default.asp"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(Arc::new(InstantSleeper::default()));

    assert!(client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .is_none());
}

#[tokio::test]
async fn changed_layout_yields_empty_result() {
    let server = MockServer::start().await;
    mount_handshake(&server, 1).await;
    mount_query(&server, &redirect_page()).await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<HTML><BODY><DIV class=grid><SPAN>2022</SPAN><SPAN>10789</SPAN></DIV></BODY></HTML>",
        ))
        .mount(&server)
        .await;

    let client = LsnClient::new(config_for(&server))
        .unwrap()
        .with_sleeper(Arc::new(InstantSleeper::default()));

    let result = client
        .fetch_steuereinnahmen(regions::NORDSTEMMEN, HierarchyLevel::Municipality)
        .await
        .expect("degraded result");
    assert!(result.is_empty());
    assert_eq!(result.region.name, "Unknown");
    assert_eq!(result.region.short_key, "254026");
}
