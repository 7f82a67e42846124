use clap::Parser;
use jitlab_client::ClientConfig;
use jitlab_common::{BenchError, FilesRequest, Result, WorkRequest};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::workload::{RequestBuilder, Workload, WorkloadKind};

#[derive(Parser, Debug, Clone)]
#[command(name = "jitlab-bench", about = "Closed-loop HTTP load generator for the JITLab workload server")]
pub struct Args {
    /// Server root URL; the workload supplies the endpoint path
    #[arg(long, default_value = "http://localhost:8080")]
    pub base: String,

    /// Endpoint to drive: cpu | image-compress | files
    #[arg(long, value_enum, default_value_t = WorkloadKind::Cpu)]
    pub workload: WorkloadKind,

    /// Number of concurrent request loops (default: 8, files: 4)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// cpu / image-compress: work iterations per request
    #[arg(long, default_value_t = 2000)]
    pub iterations: u32,

    /// cpu / image-compress: payload size per request
    #[arg(long = "payloadSize", default_value_t = 20000)]
    pub payload_size: u32,

    /// files: number of files the server creates per request
    #[arg(long = "fileCount", default_value_t = 5)]
    pub file_count: u32,

    /// files: size of each created file in bytes
    #[arg(long = "fileSizeBytes", default_value_t = 65536)]
    pub file_size_bytes: u32,

    /// files: filename prefix
    #[arg(long, default_value = "blob")]
    pub prefix: String,

    /// Warmup seconds before recording starts (default: 10, files: 5)
    #[arg(long = "warmupSec", value_parser = parse_seconds)]
    pub warmup: Option<Duration>,

    /// Recording seconds (default: 30, files: 20)
    #[arg(long = "runSec", value_parser = parse_seconds)]
    pub run: Option<Duration>,

    /// Per-request timeout in seconds (default: 60, files: 300)
    #[arg(long = "requestTimeoutSec", value_parser = parse_seconds)]
    pub request_timeout: Option<Duration>,

    /// TCP connect timeout in seconds (default: 5, files: 10)
    #[arg(long = "connectTimeoutSec", value_parser = parse_seconds)]
    pub connect_timeout: Option<Duration>,

    /// How long to wait for workers to exit after stop (default: 30, files: 60)
    #[arg(long = "graceSec", value_parser = parse_seconds)]
    pub grace: Option<Duration>,

    /// Free-text tag echoed in the report (default: workload name)
    #[arg(long)]
    pub label: Option<String>,
}

/// Longest duration any flag accepts. Larger values overflow `Instant` arithmetic.
pub const MAX_DURATION: Duration = Duration::from_secs(u32::MAX as u64);

/// Parse a non-negative, finite number of seconds (fractions allowed), at most [`MAX_DURATION`].
pub fn parse_seconds(raw: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("expected a number of seconds, got {raw:?}"))?;
    let duration =
        Duration::try_from_secs_f64(secs).map_err(|_| format!("expected non-negative finite seconds, got {raw:?}"))?;
    if duration > MAX_DURATION {
        return Err(format!("expected at most {} seconds, got {raw:?}", MAX_DURATION.as_secs()));
    }
    Ok(duration)
}

/// Everything one run needs. Built once before any worker starts and never mutated.
#[derive(Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub concurrency: usize,
    pub warmup: Duration,
    pub run: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub grace: Duration,
    pub label: String,
    pub request_builder: Arc<dyn RequestBuilder>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("base_url", &self.base_url)
            .field("concurrency", &self.concurrency)
            .field("warmup", &self.warmup)
            .field("run", &self.run)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("grace", &self.grace)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl RunConfig {
    /// Resolve unset flags against the workload's defaults and validate the result.
    pub fn from_args(args: &Args) -> Result<Self> {
        let defaults = args.workload.defaults();

        let workload = match args.workload {
            WorkloadKind::Cpu => Workload::cpu(work_request(args))?,
            WorkloadKind::ImageCompress => Workload::image_compress(work_request(args))?,
            WorkloadKind::Files => Workload::files(FilesRequest {
                file_count: args.file_count,
                file_size_bytes: args.file_size_bytes,
                prefix: args.prefix.clone(),
            })?,
        };

        let config = RunConfig {
            base_url: args.base.clone(),
            concurrency: args.concurrency.unwrap_or(defaults.concurrency),
            warmup: args.warmup.unwrap_or(defaults.warmup),
            run: args.run.unwrap_or(defaults.run),
            request_timeout: args.request_timeout.unwrap_or(defaults.request_timeout),
            connect_timeout: args.connect_timeout.unwrap_or(defaults.connect_timeout),
            grace: args.grace.unwrap_or(defaults.grace),
            label: args.label.clone().unwrap_or_else(|| defaults.label.to_string()),
            request_builder: Arc::new(workload),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency < 1 {
            return Err(BenchError::InvalidConcurrency(self.concurrency));
        }
        if self.run.is_zero() {
            return Err(BenchError::invalid_argument("runSec", "must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(BenchError::invalid_argument("requestTimeoutSec", "must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(BenchError::invalid_argument("connectTimeoutSec", "must be greater than zero"));
        }
        let durations = [
            ("warmupSec", self.warmup),
            ("runSec", self.run),
            ("requestTimeoutSec", self.request_timeout),
            ("connectTimeoutSec", self.connect_timeout),
            ("graceSec", self.grace),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| *d > MAX_DURATION) {
            return Err(BenchError::invalid_argument(
                name,
                format!("must be at most {} seconds", MAX_DURATION.as_secs()),
            ));
        }
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(BenchError::invalid_argument(
                "base",
                format!("expected an http:// or https:// URL, got {:?}", self.base_url),
            ));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

fn work_request(args: &Args) -> WorkRequest {
    WorkRequest { iterations: args.iterations, payload_size: args.payload_size }
}
