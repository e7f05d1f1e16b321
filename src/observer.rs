//! The `Observer` collaborator — ground-truth queries against a
//! real AI system are an external concern; the core treats observation
//! purely as signal for the calibration loop. Scoring a Run never requires
//! observation to succeed.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ObservationRequest {
    pub provider: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct ObservationResponse {
    pub text: String,
    pub estimated_cost_usd: f64,
}

impl ObservationResponse {
    pub fn new(text: impl Into<String>, estimated_cost_usd: f64) -> Self {
        Self {
            text: text.into(),
            estimated_cost_usd,
        }
    }
}

#[async_trait]
pub trait Observer: Send + Sync {
    async fn query_ai(
        &self,
        requests: Vec<ObservationRequest>,
    ) -> anyhow::Result<Vec<ObservationResponse>>;
}

/// Default no-op implementation: never called in tests that don't opt into
/// `include_observation`.
pub struct NullObserver;

#[async_trait]
impl Observer for NullObserver {
    async fn query_ai(
        &self,
        _requests: Vec<ObservationRequest>,
    ) -> anyhow::Result<Vec<ObservationResponse>> {
        Ok(Vec::new())
    }
}

/// Returns canned responses in request order — for calibration-loop tests
/// that need deterministic "observed" ground truth without a live provider.
pub struct StaticObserver {
    pub canned: Vec<ObservationResponse>,
}

#[async_trait]
impl Observer for StaticObserver {
    async fn query_ai(
        &self,
        requests: Vec<ObservationRequest>,
    ) -> anyhow::Result<Vec<ObservationResponse>> {
        Ok(self.canned.iter().take(requests.len()).cloned().collect())
    }
}
