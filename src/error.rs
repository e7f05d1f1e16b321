//! Typed error kinds per module, composed into one crate-wide enum
//! for callers that just need to propagate and log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("timeout fetching {url}")]
    Timeout { url: String },
    #[error("content too large ({size} bytes) for {url}")]
    TooLarge { url: String, size: u64 },
    #[error("skipped non-html url {0}")]
    SkippedExtension(String),
}

impl FetchError {
    /// Transient network/5xx/429 failures are retryable; 4xx (excluding 429) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            FetchError::TooLarge { .. } | FetchError::SkippedExtension(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed url: {0}")]
    InvalidSeed(String),
    #[error("zero pages crawled successfully")]
    ZeroPagesCrawled,
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("page has no extracted text to chunk")]
    EmptyPage,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("retriever returned zero chunks for question {question_id}")]
    RetrievalEmpty { question_id: crate::ids::QuestionId },
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("pillar weights sum to {sum}, must sum to 100")]
    WeightsDoNotSumTo100 { sum: f64 },
    #[error("pillar weight {weight} for {pillar} out of [0,100]")]
    WeightOutOfRange { pillar: String, weight: f64 },
}

#[derive(Debug, Error)]
pub enum FindableError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Crawl(#[from] CrawlError),
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FindableError>;
