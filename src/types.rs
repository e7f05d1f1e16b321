//! The audit data model. All entities are immutable once written
//! unless noted; identifiers are the opaque newtypes in [`crate::ids`].

use crate::ids::{ChunkId, ConfigId, ExperimentId, PageId, QuestionId, RunId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------- Site

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub site_id: SiteId,
    /// Normalized host, e.g. "example.com" (no scheme, no trailing dot).
    pub domain: String,
    pub business_model: Option<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    pub plan_caps: Option<PlanCaps>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCaps {
    pub max_pages: usize,
    pub max_runs_per_month: usize,
}

// ----------------------------------------------------------------------- Run

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Partial,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunProgress {
    pub step: String,
    pub pages: usize,
    pub chunks: usize,
    pub questions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    pub site_id: SiteId,
    pub status: RunStatus,
    pub progress: RunProgress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Pillar weights + answerability thresholds snapshotted at Run start —
    /// no global singleton for tunables, so a config change mid-flight must
    /// not alter in-flight Runs.
    pub calibration_config: CalibrationConfig,
    pub urls_blocked: usize,
    pub urls_failed: usize,
}

// ---------------------------------------------------------------------- Page

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timing {
    pub ttfb_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLinks {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaType {
    FaqPage,
    Article,
    Organization,
    HowTo,
    Product,
    RealEstateListing,
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaObject {
    pub schema_type: SchemaType,
    pub valid: bool,
    pub raw: serde_json::Value,
    pub has_author: bool,
    pub has_date_modified: bool,
}

/// A SHA-256 content digest. Displayed hex-encoded for logs and reports.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        ContentHash(out)
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("content hash must be 32 bytes"));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(ContentHash(out))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub page_id: PageId,
    pub run_id: RunId,
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub raw_html_ref: Option<String>,
    pub extracted_text: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub language: Option<String>,
    pub headings: Vec<Heading>,
    pub schema: Vec<SchemaObject>,
    pub links: PageLinks,
    pub timing: Timing,
    pub content_hash: ContentHash,
    pub author: Option<String>,
    pub date_modified: Option<DateTime<Utc>>,
    pub is_https: bool,
    pub has_framework_markers: bool,
    pub code_block_count: usize,
    pub list_count: usize,
    pub table_count: usize,
}

// -------------------------------------------------------------------- Chunk

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Text,
    Heading,
    List,
    Table,
    Code,
    Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub page_id: PageId,
    pub ordinal: usize,
    pub chunk_type: ChunkType,
    pub heading_path: Vec<String>,
    pub text: String,
    pub token_estimate: usize,
    pub position_ratio: f64,
    pub content_hash: ContentHash,
}

// --------------------------------------------------------------- Embedding

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub chunk_id: ChunkId,
    pub model_id: String,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn norm(&self) -> f32 {
        self.vector.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

// ---------------------------------------------------------------- Question

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Universal,
    Derived,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question_id: QuestionId,
    pub source: QuestionSource,
    pub text: String,
    pub category: String,
    pub difficulty: f64,
    pub weight: f64,
    pub expected_signals: Vec<String>,
}

// --------------------------------------------------------------- SimResult

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answerability {
    FullyAnswerable,
    PartiallyAnswerable,
    Unanswered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub rrf_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    pub question_id: QuestionId,
    pub run_id: RunId,
    pub retrieved: Vec<RetrievedChunk>,
    pub signals_found: usize,
    pub signals_total: usize,
    pub answerability: Answerability,
    pub confidence: f64,
    pub score: f64,
}

// ------------------------------------------------------------- PillarScore

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Technical,
    Structure,
    Schema,
    Authority,
    EntityRecognition,
    Retrieval,
    Coverage,
}

impl Pillar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Technical => "technical",
            Pillar::Structure => "structure",
            Pillar::Schema => "schema",
            Pillar::Authority => "authority",
            Pillar::EntityRecognition => "entity_recognition",
            Pillar::Retrieval => "retrieval",
            Pillar::Coverage => "coverage",
        }
    }
}

/// Progress-language only — never "critical" in a user-facing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Full,
    Partial,
    Limited,
}

impl ProgressLevel {
    pub fn from_raw(raw: f64) -> Self {
        if raw >= 80.0 {
            ProgressLevel::Full
        } else if raw >= 50.0 {
            ProgressLevel::Partial
        } else {
            ProgressLevel::Limited
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentScore {
    pub name: String,
    pub weight_pct: f64,
    pub raw: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub level: ProgressLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarScore {
    pub run_id: RunId,
    pub pillar: Pillar,
    pub raw: f64,
    pub weighted_points: f64,
    pub level: ProgressLevel,
    pub components: Vec<ComponentScore>,
    pub issues: Vec<Issue>,
}

// ---------------------------------------------------------------------- Fix

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    pub reason_code: String,
    pub title: String,
    pub explanation: String,
    pub scaffold: String,
    pub target_url: Option<String>,
    pub priority: u8,
    pub effort: Effort,
    pub estimated_impact_points: f64,
    pub affected_pillar: Pillar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCenter {
    pub quick_wins: Vec<Fix>,
    pub high_priority: Vec<Fix>,
    pub by_category: HashMap<String, Vec<Fix>>,
    /// Diminishing-returns total across every fix, capped at 30 points —
    /// the realistic score lift from acting on the whole plan at once.
    pub total_capped_impact_points: f64,
}

// -------------------------------------------------------------------- Report

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindabilityLevel {
    NotYetFindable,
    PartiallyFindable,
    Findable,
    HighlyFindable,
    Optimized,
}

impl FindabilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            FindabilityLevel::NotYetFindable
        } else if score < 55.0 {
            FindabilityLevel::PartiallyFindable
        } else if score < 70.0 {
            FindabilityLevel::Findable
        } else if score < 85.0 {
            FindabilityLevel::HighlyFindable
        } else {
            FindabilityLevel::Optimized
        }
    }

    pub fn next_milestone(&self) -> Option<f64> {
        match self {
            FindabilityLevel::NotYetFindable => Some(40.0),
            FindabilityLevel::PartiallyFindable => Some(55.0),
            FindabilityLevel::Findable => Some(70.0),
            FindabilityLevel::HighlyFindable => Some(85.0),
            FindabilityLevel::Optimized => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathLine {
    pub pillar: Pillar,
    pub raw: f64,
    pub weight_pct: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: RunId,
    pub total_score: f64,
    /// Present only when some pillars were skipped: `Σ weights of evaluated`.
    pub evaluated_max: Option<f64>,
    pub level: FindabilityLevel,
    pub points_to_milestone: Option<f64>,
    pub pillar_scores: Vec<PillarScore>,
    pub fixes: Vec<Fix>,
    pub action_center: ActionCenter,
    pub show_the_math: Vec<MathLine>,
}

// -------------------------------------------------------------- Calibration

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedOutcome {
    Correct,
    Optimistic,
    Pessimistic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub run_id: RunId,
    pub question_id: QuestionId,
    pub sim_prediction: Answerability,
    /// The raw per-question score ∈ [0,1] the prediction was classified
    /// from, recorded so the threshold optimizer can replay classification
    /// under candidate thresholds without re-running simulation.
    pub score: f64,
    pub observed_outcome: ObservedOutcome,
    pub category: String,
    pub pillar_scores_snapshot: Vec<PillarScore>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    Draft,
    Validated,
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationThresholds {
    pub fully_answerable: f64,
    pub partially_answerable: f64,
    pub signal_match: f64,
}

impl Default for CalibrationThresholds {
    fn default() -> Self {
        Self {
            fully_answerable: 0.5,
            partially_answerable: 0.15,
            signal_match: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub config_id: ConfigId,
    pub name: String,
    pub status: CalibrationStatus,
    pub weights: HashMap<Pillar, f64>,
    pub thresholds: CalibrationThresholds,
}

impl CalibrationConfig {
    /// The shipped default: six pillars active, Entity Recognition disabled.
    /// Weights defaults (Retrieval 25, Coverage 10, the
    /// remaining 65 split across Technical/Structure/Schema/Authority in
    /// proportion to their described emphasis).
    pub fn default_active() -> Self {
        let mut weights = HashMap::new();
        weights.insert(Pillar::Technical, 20.0);
        weights.insert(Pillar::Structure, 20.0);
        weights.insert(Pillar::Schema, 15.0);
        weights.insert(Pillar::Authority, 10.0);
        weights.insert(Pillar::Retrieval, 25.0);
        weights.insert(Pillar::Coverage, 10.0);
        Self {
            config_id: ConfigId::new(),
            name: "default".to_string(),
            status: CalibrationStatus::Active,
            weights,
            thresholds: CalibrationThresholds::default(),
        }
    }

    /// Validates the Σ=100 / per-weight-in-[0,100] invariant.
    pub fn validate(&self) -> std::result::Result<(), crate::error::CalibrationError> {
        let sum: f64 = self.weights.values().sum();
        if (sum - 100.0).abs() > 0.01 {
            return Err(crate::error::CalibrationError::WeightsDoNotSumTo100 { sum });
        }
        for (pillar, weight) in &self.weights {
            if !(0.0..=100.0).contains(weight) {
                return Err(crate::error::CalibrationError::WeightOutOfRange {
                    pillar: pillar.as_str().to_string(),
                    weight: *weight,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Concluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentCounts {
    pub control: usize,
    pub treatment: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentArm {
    Control,
    Treatment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub exp_id: ExperimentId,
    pub control_config_id: ConfigId,
    pub treatment_config_id: ConfigId,
    pub status: ExperimentStatus,
    pub assignment_seed: String,
    pub counts: ExperimentCounts,
    pub winner: Option<ExperimentArm>,
}
