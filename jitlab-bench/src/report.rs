use std::borrow::Cow;
use std::time::Duration;

use crate::config::RunConfig;
use crate::driver::RunResult;

/// Render the two-line CSV report: a header naming every column, then the run's row.
pub fn format(config: &RunConfig, result: &RunResult) -> String {
    format!("{}\n{}\n", header(config, result), row(config, result))
}

pub fn header(config: &RunConfig, result: &RunResult) -> String {
    let mut columns: Vec<&str> = vec!["label", "concurrency"];
    let params = config.request_builder.csv_columns();
    columns.extend(params.iter().map(|(name, _)| *name));
    columns.extend([
        "warmupSec",
        "runSec",
        "ok",
        "err",
        "throughput_rps",
        "avg_ms",
        "p50_ms",
        "p95_ms",
        "p99_ms",
    ]);
    if result.aux.is_some() {
        columns.extend(["create_p50_ms", "create_p95_ms"]);
    }
    columns.join(",")
}

pub fn row(config: &RunConfig, result: &RunResult) -> String {
    let mut fields: Vec<String> = vec![csv_field(&config.label).into_owned(), config.concurrency.to_string()];
    fields.extend(config.request_builder.csv_columns().into_iter().map(|(_, value)| csv_field(&value).into_owned()));
    fields.extend([
        format_seconds(config.warmup),
        format_seconds(config.run),
        result.ok_count.to_string(),
        result.err_count.to_string(),
        format!("{:.2}", result.throughput_rps),
        format!("{:.3}", result.mean_ms),
        format!("{:.3}", result.p50_ms),
        format!("{:.3}", result.p95_ms),
        format!("{:.3}", result.p99_ms),
    ]);
    if let Some(aux) = &result.aux {
        fields.push(format!("{:.0}", aux.p50));
        fields.push(format!("{:.0}", aux.p95));
    }
    fields.join(",")
}

/// Whole seconds print without a fraction (`10`), anything else as the shortest decimal (`0.5`).
pub fn format_seconds(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        d.as_secs().to_string()
    } else {
        d.as_secs_f64().to_string()
    }
}

/// Quote a field if it contains a comma, quote, or line break.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
