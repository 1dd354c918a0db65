use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

/// Counters for consensus runs and scoring. Each instance owns its registry.
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Registry,
    pub points_labeled: IntCounter,
    pub clusters_formed: IntCounter,
    pub consensus_retained: IntCounter,
    pub consensus_discarded: IntCounter,
    pub submissions_scored: IntCounter,
    pub submission_scores: Histogram,
}

impl PipelineMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("orbital_consensus".to_string()), None)?;

        let points_labeled = IntCounter::new(
            "points_labeled_total",
            "Observations assigned a cluster label",
        )?;
        let clusters_formed = IntCounter::new(
            "clusters_formed_total",
            "Distinct clusters produced by aggregation",
        )?;
        let consensus_retained = IntCounter::new(
            "consensus_retained_total",
            "Consensus points kept by the confidence filter",
        )?;
        let consensus_discarded = IntCounter::new(
            "consensus_discarded_total",
            "Consensus points dropped by the confidence filter",
        )?;
        let submissions_scored = IntCounter::new(
            "submissions_scored_total",
            "Participant submissions scored against a consensus model",
        )?;
        let submission_scores = Histogram::with_opts(
            HistogramOpts::new("submission_score", "Score per participant submission")
                .buckets(vec![0.0, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
        )?;

        registry.register(Box::new(points_labeled.clone()))?;
        registry.register(Box::new(clusters_formed.clone()))?;
        registry.register(Box::new(consensus_retained.clone()))?;
        registry.register(Box::new(consensus_discarded.clone()))?;
        registry.register(Box::new(submissions_scored.clone()))?;
        registry.register(Box::new(submission_scores.clone()))?;

        Ok(Self {
            registry,
            points_labeled,
            clusters_formed,
            consensus_retained,
            consensus_discarded,
            submissions_scored,
            submission_scores,
        })
    }

    pub fn record_submission(&self, score: f64) {
        self.submissions_scored.inc();
        self.submission_scores.observe(score);
    }

    /// Prometheus text exposition of every metric in this registry.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics")
            .field("points_labeled", &self.points_labeled.get())
            .field("clusters_formed", &self.clusters_formed.get())
            .field("consensus_retained", &self.consensus_retained.get())
            .field("consensus_discarded", &self.consensus_discarded.get())
            .field("submissions_scored", &self.submissions_scored.get())
            .finish()
    }
}
