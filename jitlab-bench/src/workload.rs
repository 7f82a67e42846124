use clap::ValueEnum;
use jitlab_client::RequestSpec;
use jitlab_common::{BenchError, FilesRequest, RequestError, WorkRequest, CREATE_ELAPSED_HEADER};
use std::time::Duration;

/// Produces the request a worker issues on each iteration.
///
/// Implementations are shared by every worker, so `build` must be cheap and must not
/// block. A failed build counts as a failed request, not a fatal error.
pub trait RequestBuilder: Send + Sync {
    fn build(&self) -> Result<RequestSpec, RequestError>;

    /// Response header carrying an endpoint-specific integer metric, if the endpoint reports one.
    fn aux_header(&self) -> Option<&str> {
        None
    }

    /// Workload parameters echoed in the CSV report, as `(column, value)` pairs.
    fn csv_columns(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkloadKind {
    Cpu,
    ImageCompress,
    Files,
}

/// Per-workload fallbacks for flags the operator left unset.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadDefaults {
    pub concurrency: usize,
    pub warmup: Duration,
    pub run: Duration,
    pub label: &'static str,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub grace: Duration,
}

impl WorkloadKind {
    pub fn as_name(&self) -> &'static str {
        match self {
            WorkloadKind::Cpu => "cpu",
            WorkloadKind::ImageCompress => "image-compress",
            WorkloadKind::Files => "files",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            WorkloadKind::Cpu => "/work/cpu",
            WorkloadKind::ImageCompress => "/work/image-compress",
            WorkloadKind::Files => "/work/files",
        }
    }

    /// Zip generation is slow and heavy, so the files workload runs fewer workers
    /// with longer timeouts than the compute endpoints. Grace never undercuts the
    /// request timeout.
    pub fn defaults(&self) -> WorkloadDefaults {
        match self {
            WorkloadKind::Cpu | WorkloadKind::ImageCompress => WorkloadDefaults {
                concurrency: 8,
                warmup: Duration::from_secs(10),
                run: Duration::from_secs(30),
                label: if *self == WorkloadKind::Cpu { "default" } else { "image-compress" },
                request_timeout: Duration::from_secs(60),
                connect_timeout: Duration::from_secs(5),
                grace: Duration::from_secs(60),
            },
            WorkloadKind::Files => WorkloadDefaults {
                concurrency: 4,
                warmup: Duration::from_secs(5),
                run: Duration::from_secs(20),
                label: "files",
                request_timeout: Duration::from_secs(300),
                connect_timeout: Duration::from_secs(10),
                grace: Duration::from_secs(300),
            },
        }
    }
}

/// A fixed request against one of the known workload endpoints.
///
/// The body is serialized once up front; every iteration sends the same bytes.
#[derive(Debug, Clone)]
pub struct Workload {
    spec: RequestSpec,
    aux_header: Option<&'static str>,
    columns: Vec<(&'static str, String)>,
}

impl Workload {
    pub fn cpu(body: WorkRequest) -> Result<Self, BenchError> {
        Self::compute(WorkloadKind::Cpu, body)
    }

    pub fn image_compress(body: WorkRequest) -> Result<Self, BenchError> {
        Self::compute(WorkloadKind::ImageCompress, body)
    }

    pub fn files(body: FilesRequest) -> Result<Self, BenchError> {
        let columns = vec![
            ("fileCount", body.file_count.to_string()),
            ("fileSizeBytes", body.file_size_bytes.to_string()),
        ];
        let spec = prepare(WorkloadKind::Files, &body)?;
        Ok(Self { spec, aux_header: Some(CREATE_ELAPSED_HEADER), columns })
    }

    fn compute(kind: WorkloadKind, body: WorkRequest) -> Result<Self, BenchError> {
        let columns = vec![
            ("iterations", body.iterations.to_string()),
            ("payloadSize", body.payload_size.to_string()),
        ];
        let spec = prepare(kind, &body)?;
        Ok(Self { spec, aux_header: None, columns })
    }
}

fn prepare<T: serde::Serialize>(kind: WorkloadKind, body: &T) -> Result<RequestSpec, BenchError> {
    RequestSpec::post_json(kind.path(), body)
        .map_err(|e| BenchError::invalid_argument("workload", e.to_string()))
}

impl RequestBuilder for Workload {
    fn build(&self) -> Result<RequestSpec, RequestError> {
        Ok(self.spec.clone())
    }

    fn aux_header(&self) -> Option<&str> {
        self.aux_header
    }

    fn csv_columns(&self) -> Vec<(&'static str, String)> {
        self.columns.clone()
    }
}
