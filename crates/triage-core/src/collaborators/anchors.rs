//! Semantic urgency estimator.
//!
//! Scores text by comparing its embedding against a handful of fixed anchor
//! phrases. Each axis is the similarity gap between a positive and a negative
//! anchor, mapped onto `[1, 10]`:
//!
//! ```text
//! axis(pos, neg) = clamp(((sim(pos) − sim(neg)) / 0.25 + 1) / 2 · 10, 1, 10)
//! ```
//!
//! The anchors are embedded once, when the estimator is built.

use async_trait::async_trait;

use super::traits::UrgencyEstimator;
use crate::error::CollaboratorError;
use crate::scoring::{round_to, Sliders};

/// Turns text into a vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

/// Lower values make an axis react to smaller similarity gaps.
const SENSITIVITY: f64 = 0.25;
/// Similarity to the "trivial errand" anchor above which fear and urgency are damped.
const TRIVIAL_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    EmotionalUrgency,
    TemporalUrgency,
    NonUrgency,
    Interest,
    Boredom,
    Fear,
    Comfort,
    Trivial,
}

const ANCHORS: [(Anchor, &str); 8] = [
    (
        Anchor::EmotionalUrgency,
        "I am under intense pressure and feel like time is running out right now",
    ),
    (
        Anchor::TemporalUrgency,
        "This has a strict deadline and must be finished very soon",
    ),
    (
        Anchor::NonUrgency,
        "This can wait indefinitely and there is absolutely no time pressure",
    ),
    (
        Anchor::Interest,
        "I am genuinely excited and actively want to do this right now",
    ),
    (
        Anchor::Boredom,
        "This feels painfully boring and I want to escape doing it",
    ),
    (
        Anchor::Fear,
        "I am scared this will go badly and have serious negative consequences",
    ),
    (
        Anchor::Comfort,
        "This feels completely safe familiar and low risk",
    ),
    (
        Anchor::Trivial,
        "This is a tiny simple errand that requires almost no effort",
    ),
];

/// Estimator backed by an [`Embedder`] and pre-embedded anchors.
pub struct AnchorEstimator<E> {
    embedder: E,
    anchors: Vec<(Anchor, Vec<f32>)>,
}

impl<E: Embedder> AnchorEstimator<E> {
    /// Embed every anchor phrase up front.
    ///
    /// # Errors
    /// Fails if the embedder fails on any anchor; there is no partial estimator.
    pub async fn new(embedder: E) -> Result<Self, CollaboratorError> {
        let mut anchors = Vec::with_capacity(ANCHORS.len());
        for (anchor, phrase) in ANCHORS {
            anchors.push((anchor, embedder.embed(phrase).await?));
        }
        tracing::debug!(model = embedder.model(), "anchor embeddings ready");
        Ok(Self { embedder, anchors })
    }

    fn anchor(&self, which: Anchor) -> &[f32] {
        self.anchors
            .iter()
            .find(|(a, _)| *a == which)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    fn axis(&self, text: &[f32], pos: Anchor, neg: Anchor) -> f64 {
        let diff = cosine(text, self.anchor(pos)) - cosine(text, self.anchor(neg));
        let normalized = (diff / SENSITIVITY + 1.0) / 2.0;
        round_to((normalized * 10.0).clamp(1.0, 10.0), 1)
    }

    /// Map an embedding onto slider readings.
    fn score(&self, text: &[f32]) -> Sliders {
        let emotional = self.axis(text, Anchor::EmotionalUrgency, Anchor::NonUrgency);
        let temporal = self.axis(text, Anchor::TemporalUrgency, Anchor::NonUrgency);
        let mut urgency = temporal.max(emotional * 0.8 + temporal * 0.4).min(10.0);

        let mut fear = self.axis(text, Anchor::Fear, Anchor::Comfort);
        let interest = (self.axis(text, Anchor::Interest, Anchor::Boredom) - fear * 0.3).max(1.0);

        let triviality = cosine(text, self.anchor(Anchor::Trivial));
        if triviality > TRIVIAL_THRESHOLD {
            fear = (fear - triviality * 8.0).max(1.0);
            urgency = (urgency - triviality * 2.0).max(1.0);
        }

        Sliders::new(round_to(urgency, 1), round_to(fear, 1), round_to(interest, 1))
    }
}

#[async_trait]
impl<E: Embedder> UrgencyEstimator for AnchorEstimator<E> {
    fn name(&self) -> &str {
        self.embedder.model()
    }

    async fn estimate(&self, text: &str) -> Result<Sliders, CollaboratorError> {
        let vector = self.embedder.embed(text).await?;
        Ok(self.score(&vector))
    }
}

/// Cosine similarity; 0 for empty, mismatched or zero-length vectors.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
