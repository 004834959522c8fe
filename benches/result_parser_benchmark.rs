//! Result page parsing throughput
//!
//! - 30-year time series (typical Z9200001 page)
//! - page without readable rows (fallback scan path)
//! - German amount parsing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lsn_client::infrastructure::number_format::parse_amount;
use lsn_client::infrastructure::result_parser::{ResultPageParser, ResultParser};

fn time_series_page(years: i32) -> String {
    let mut rows = String::new();
    for (i, year) in (1995..1995 + years).enumerate() {
        rows.push_str(&format!(
            "<TR class=line{}><TD class=left>&nbsp;{}</TD><TD>10.812</TD><TD>11.204.571</TD>\
             <TD>94.120</TD><TD>1.587.302</TD><TD>3.998.001</TD><TD>5.102.345</TD><TD>422.803</TD></TR>\n",
            i % 2 + 1,
            year
        ));
    }
    format!(
        "<HTML><BODY><TABLE><TR><TD class=left COLSPAN=8>254026 Nordstemmen</TD></TR>\n{rows}</TABLE></BODY></HTML>"
    )
}

fn partial_page(years: i32) -> String {
    let rows: String = (1995..1995 + years)
        .map(|year| format!("<TR class=line1><TD class=left>&nbsp;{year}</TD><TD>10812</TD></TR>\n"))
        .collect();
    format!("<HTML><BODY><TABLE>{rows}</TABLE></BODY></HTML>")
}

fn bench_result_parser(c: &mut Criterion) {
    let parser = ResultPageParser::new().expect("parser");
    let full = time_series_page(30);
    let partial = partial_page(30);

    c.bench_function("parse_time_series_30_years", |b| {
        b.iter(|| parser.parse(black_box(&full), "Z9200001", "254026000"));
    });

    c.bench_function("parse_unreadable_page", |b| {
        b.iter(|| parser.parse(black_box(&partial), "Z9200001", "254026000"));
    });
}

fn bench_number_format(c: &mut Criterion) {
    let samples = ["24.694.300", "-0,70", "-", "1.234.567,89", "95.233"];

    c.bench_function("parse_amount", |b| {
        b.iter(|| {
            for sample in &samples {
                let _ = black_box(parse_amount(black_box(sample)));
            }
        });
    });
}

criterion_group!(benches, bench_result_parser, bench_number_format);
criterion_main!(benches);
