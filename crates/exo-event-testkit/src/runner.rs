//! Conformance runner.
//!
//! Drives each golden vector through an encoder and a hasher and compares
//! the result against the vector's expectation. Failures are per vector;
//! nothing a single vector does can abort the run.

use std::fmt;
use std::sync::Arc;

use exo_event_core::{
    Blake3Hasher, CanonicalEncoder, CborEncoder, ContentHasher, EncodingError, EventId,
};
use thiserror::Error;

use crate::file::VectorFormatError;
use crate::record::RecordError;
use crate::vectors::{Expectation, GoldenVector, Registry};

/// Runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Compare canonical bytes when a vector pins them.
    pub check_canonical_bytes: bool,
    /// Evaluate superseded vectors instead of skipping them.
    pub include_superseded: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            check_canonical_bytes: true,
            include_superseded: false,
        }
    }
}

/// Why a vector did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformanceMismatch {
    #[error("digest mismatch: expected {expected}, got {actual}")]
    Digest { expected: String, actual: EventId },

    #[error("canonical bytes mismatch: expected {expected}, got {actual}")]
    CanonicalBytes {
        expected: String,
        actual: String,
        digest: EventId,
    },

    #[error("encoding failed: {0}")]
    Encoding(EncodingError),

    #[error("invalid event record: {0}")]
    InvalidRecord(String),

    #[error("expected rejection `{expected}`, but encoding succeeded with digest {actual}")]
    UnexpectedSuccess { expected: String, actual: EventId },

    #[error("expected rejection `{expected}`, got `{}`", actual.kind())]
    WrongRejection {
        expected: String,
        actual: EncodingError,
    },

    #[error("evaluation panicked: {0}")]
    Panicked(String),
}

impl ConformanceMismatch {
    /// The digest the implementation produced, when it produced one.
    pub fn actual_digest(&self) -> Option<EventId> {
        match self {
            Self::Digest { actual, .. } | Self::UnexpectedSuccess { actual, .. } => Some(*actual),
            Self::CanonicalBytes { digest, .. } => Some(*digest),
            _ => None,
        }
    }
}

/// Outcome of evaluating one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorOutcome {
    /// Encoded and hashed to the expected digest.
    Pass { digest: EventId },
    /// Rejected with the expected kind.
    Rejected { kind: String },
    Fail(ConformanceMismatch),
    Skipped { superseded_by: String },
}

impl VectorOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. } | Self::Rejected { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }
}

/// One vector's outcome, attributed to its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorResult {
    pub source: String,
    pub id: String,
    pub outcome: VectorOutcome,
}

/// A vector source that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub source: String,
    pub error: VectorFormatError,
}

/// How report lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// `<id>: PASS` and friends.
    #[default]
    Verdict,
    /// `<id>: <hex digest>` where a digest was computed.
    Digest,
}

/// Aggregated results of one or more runs.
#[derive(Debug, Default)]
pub struct ConformanceReport {
    pub results: Vec<VectorResult>,
    pub load_failures: Vec<LoadFailure>,
}

impl ConformanceReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_fail()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, VectorOutcome::Skipped { .. }))
            .count()
    }

    /// True when no vector failed and every source loaded.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.load_failures.is_empty()
    }

    pub fn merge(&mut self, other: ConformanceReport) {
        self.results.extend(other.results);
        self.load_failures.extend(other.load_failures);
    }

    pub fn record_load_failure(&mut self, source: impl Into<String>, error: VectorFormatError) {
        let source = source.into();
        tracing::warn!(source = %source, error = %error, "vector source failed to load");
        self.load_failures.push(LoadFailure { source, error });
    }

    fn push(&mut self, source: &str, id: String, outcome: VectorOutcome) {
        if let VectorOutcome::Fail(mismatch) = &outcome {
            tracing::warn!(source = %source, vector = %id, %mismatch, "conformance mismatch");
        }
        self.results.push(VectorResult {
            source: source.to_string(),
            id,
            outcome,
        });
    }

    /// Render one line per vector, then one per load failure.
    pub fn lines(&self, style: ReportStyle) -> Vec<String> {
        let mut lines: Vec<String> = self
            .results
            .iter()
            .map(|r| render_line(&r.id, &r.outcome, style))
            .collect();
        lines.extend(
            self.load_failures
                .iter()
                .map(|f| format!("{}: LOAD-FAIL ({})", f.source, f.error)),
        );
        lines
    }
}

fn render_line(id: &str, outcome: &VectorOutcome, style: ReportStyle) -> String {
    match (outcome, style) {
        (VectorOutcome::Pass { .. } | VectorOutcome::Rejected { .. }, ReportStyle::Verdict) => {
            format!("{}: PASS", id)
        }
        (VectorOutcome::Pass { digest }, ReportStyle::Digest) => format!("{}: {}", id, digest),
        (VectorOutcome::Rejected { kind }, ReportStyle::Digest) => {
            format!("{}: REJECTED ({})", id, kind)
        }
        (VectorOutcome::Fail(mismatch), ReportStyle::Digest) => match mismatch.actual_digest() {
            Some(digest) => format!("{}: {} FAIL ({})", id, digest, mismatch),
            None => format!("{}: FAIL ({})", id, mismatch),
        },
        (VectorOutcome::Fail(mismatch), ReportStyle::Verdict) => {
            format!("{}: FAIL ({})", id, mismatch)
        }
        (VectorOutcome::Skipped { superseded_by }, _) => {
            format!("{}: SKIP (superseded by {})", id, superseded_by)
        }
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} load failures",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.load_failures.len()
        )
    }
}

/// Runs golden vectors against an encoder and a hasher.
#[derive(Debug, Clone)]
pub struct ConformanceRunner<E = CborEncoder, H = Blake3Hasher> {
    encoder: E,
    hasher: H,
    config: RunnerConfig,
}

impl ConformanceRunner {
    /// A runner over the reference encoder and hasher.
    pub fn reference(config: RunnerConfig) -> Self {
        Self::new(CborEncoder, Blake3Hasher, config)
    }
}

impl<E: CanonicalEncoder, H: ContentHasher> ConformanceRunner<E, H> {
    pub fn new(encoder: E, hasher: H, config: RunnerConfig) -> Self {
        Self {
            encoder,
            hasher,
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Evaluate one vector. Pure: no I/O, no shared state.
    pub fn evaluate(&self, vector: &GoldenVector) -> VectorOutcome {
        if let Some(by) = vector.superseded_by() {
            if !self.config.include_superseded {
                return VectorOutcome::Skipped {
                    superseded_by: by.to_string(),
                };
            }
        }

        let event = match vector.event.to_event() {
            Ok(event) => event,
            Err(RecordError::Encoding(err)) => return encoding_failed(vector, err),
            Err(err) => {
                return VectorOutcome::Fail(ConformanceMismatch::InvalidRecord(err.to_string()))
            }
        };

        let bytes = match self.encoder.encode(&event) {
            Ok(bytes) => bytes,
            Err(err) => return encoding_failed(vector, err),
        };
        let digest = self.hasher.digest(&bytes);

        match &vector.expectation {
            Expectation::Rejection(kind) => {
                VectorOutcome::Fail(ConformanceMismatch::UnexpectedSuccess {
                    expected: kind.clone(),
                    actual: digest,
                })
            }
            Expectation::Digest(expected) => {
                if self.config.check_canonical_bytes {
                    if let Some(canonical) = &vector.expected_canonical {
                        let actual = hex::encode(&bytes);
                        if &actual != canonical {
                            return VectorOutcome::Fail(ConformanceMismatch::CanonicalBytes {
                                expected: canonical.clone(),
                                actual,
                                digest,
                            });
                        }
                    }
                }
                if &digest.to_hex() != expected {
                    return VectorOutcome::Fail(ConformanceMismatch::Digest {
                        expected: expected.clone(),
                        actual: digest,
                    });
                }
                VectorOutcome::Pass { digest }
            }
        }
    }

    /// Evaluate every vector in `registry` in order.
    pub fn run(&self, registry: &Registry, source: &str) -> ConformanceReport {
        let mut report = ConformanceReport::default();
        for vector in registry.vectors() {
            tracing::debug!(source = %source, vector = %vector.id, "evaluating golden vector");
            let outcome = self.evaluate(vector);
            report.push(source, vector.id.clone(), outcome);
        }
        report
    }
}

impl<E, H> ConformanceRunner<E, H>
where
    E: CanonicalEncoder + 'static,
    H: ContentHasher + 'static,
{
    /// Evaluate every vector on its own blocking task.
    ///
    /// Results come back in registry order; a task that panics is reported
    /// as a failure of its vector.
    pub async fn run_concurrent(
        self: Arc<Self>,
        registry: &Registry,
        source: &str,
    ) -> ConformanceReport {
        let handles: Vec<_> = registry
            .vectors()
            .iter()
            .cloned()
            .map(|vector| {
                let runner = Arc::clone(&self);
                let id = vector.id.clone();
                tracing::debug!(source = %source, vector = %id, "spawning golden vector");
                let handle = tokio::task::spawn_blocking(move || runner.evaluate(&vector));
                (id, handle)
            })
            .collect();

        let mut report = ConformanceReport::default();
        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => VectorOutcome::Fail(ConformanceMismatch::Panicked(err.to_string())),
            };
            report.push(source, id, outcome);
        }
        report
    }
}

fn encoding_failed(vector: &GoldenVector, err: EncodingError) -> VectorOutcome {
    match &vector.expectation {
        Expectation::Rejection(kind) if kind == err.kind() => VectorOutcome::Rejected {
            kind: kind.clone(),
        },
        Expectation::Rejection(kind) => VectorOutcome::Fail(ConformanceMismatch::WrongRejection {
            expected: kind.clone(),
            actual: err,
        }),
        Expectation::Digest(_) => VectorOutcome::Fail(ConformanceMismatch::Encoding(err)),
    }
}
