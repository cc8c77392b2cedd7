//! Stress and sampling harness
//!
//! Drives the engine against the in-memory repository and checks the
//! properties that only show up under load or across many random draws.

use crate::config::EngineConfig;
use crate::error::CreationError;
use crate::gateway::InMemoryRepository;
use crate::orchestrator::{CreateNodeRequest, GraphOrchestrator};
use ibis_layout::PositionAllocator;
use ibis_model::{AuthorId, Category, DiscussionId, Point};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Concurrent near-duplicate submissions
#[derive(Debug, Clone)]
pub struct SerializationStressConfig {
    /// Distinct authors submitting in parallel
    pub authors: usize,
    /// Near-identical submissions per author
    pub submissions_per_author: usize,
    /// Simulated gateway latency per call
    pub latency: Duration,
    /// Jitter seed
    pub seed: u64,
    /// Engine settings; the seed above overrides `rng_seed`
    pub engine: EngineConfig,
}

impl Default for SerializationStressConfig {
    fn default() -> Self {
        Self {
            authors: 8,
            submissions_per_author: 4,
            latency: Duration::from_millis(2),
            seed: 42,
            engine: EngineConfig::default(),
        }
    }
}

/// Outcome of a serialization stress run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SerializationReport {
    /// Nodes created
    pub created: usize,
    /// Submissions rejected as near-duplicates
    pub duplicates: usize,
    /// Any other failure
    pub failures: usize,
    /// Authors left in the lock table afterwards
    pub pending_authors: usize,
    /// Human-readable property violations
    pub violations: Vec<String>,
}

impl SerializationReport {
    /// No violations recorded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Fire every author's submissions at once and check that exactly one per
/// author survives the duplicate check
pub async fn run_serialization_stress(config: &SerializationStressConfig) -> SerializationReport {
    let repo = Arc::new(InMemoryRepository::with_latency(config.latency));
    let orchestrator = match GraphOrchestrator::builder(repo.clone())
        .config(config.engine.clone().with_seed(config.seed))
        .build()
    {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            return SerializationReport {
                violations: vec![format!("invalid engine config: {e}")],
                ..SerializationReport::default()
            };
        }
    };

    let discussion = DiscussionId::new("stress");
    let mut handles = Vec::with_capacity(config.authors * config.submissions_per_author);
    for author in 0..config.authors {
        for copy in 0..config.submissions_per_author {
            let orchestrator = orchestrator.clone();
            let request = CreateNodeRequest::new(
                format!("Budget reform for ward {author}{}", "!".repeat(copy)),
                Category::Issue,
                discussion.clone(),
                AuthorId::new(format!("author-{author}")),
            );
            handles.push((author, tokio::spawn(async move { orchestrator.create_node(request).await })));
        }
    }

    let mut report = SerializationReport::default();
    let mut created_per_author = vec![0usize; config.authors];
    let (authors, tasks): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
    let results = futures::future::join_all(tasks).await;
    for (author, result) in authors.into_iter().zip(results) {
        match result {
            Ok(Ok(_)) => {
                report.created += 1;
                created_per_author[author] += 1;
            }
            Ok(Err(CreationError::Duplicate { .. })) => report.duplicates += 1,
            Ok(Err(e)) => {
                report.failures += 1;
                report.violations.push(format!("author-{author}: unexpected error {e}"));
            }
            Err(e) => {
                report.failures += 1;
                report.violations.push(format!("author-{author}: task failed: {e}"));
            }
        }
    }

    for (author, created) in created_per_author.iter().enumerate() {
        if *created != 1 {
            report
                .violations
                .push(format!("author-{author}: {created} nodes created, expected exactly 1"));
        }
    }
    if repo.node_count() != report.created {
        report.violations.push(format!(
            "repository holds {} nodes, {} creations reported",
            repo.node_count(),
            report.created
        ));
    }

    report.pending_authors = orchestrator.pending_authors();
    if report.pending_authors != 0 {
        report
            .violations
            .push(format!("{} authors left in the lock table", report.pending_authors));
    }

    tracing::info!(
        created = report.created,
        duplicates = report.duplicates,
        violations = report.violations.len(),
        "serialization stress finished"
    );
    report
}

/// Allocator sampling run
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutReport {
    /// Placements drawn
    pub samples: usize,
    /// Raw allocations outside the canvas
    pub outside_canvas: usize,
    /// Constrained placements outside their zone
    pub outside_zone: usize,
    /// Constrained placements moved by a second constraint pass
    pub not_idempotent: usize,
    /// Root-issue grids with coinciding points
    pub overlapping_grids: usize,
}

impl LayoutReport {
    /// No invariant broken
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outside_canvas == 0
            && self.outside_zone == 0
            && self.not_idempotent == 0
            && self.overlapping_grids == 0
    }
}

/// Draw `samples_per_category` placements for every category, with and
/// without a parent, and check canvas, zone and grid invariants
#[must_use]
pub fn run_layout_sample(config: &EngineConfig, samples_per_category: usize, seed: u64) -> LayoutReport {
    let allocator = PositionAllocator::new(config.layout.clone());
    let zones = &config.layout.zones;
    let canvas = &config.layout.canvas;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut report = LayoutReport::default();

    for category in Category::ALL {
        for i in 0..samples_per_category {
            let parent = (i % 2 == 1).then(|| allocator.allocate(Category::Issue, None, &mut rng));
            let raw = allocator.allocate(category, parent, &mut rng);
            let placed = zones.constrain(category, raw);

            report.samples += 1;
            if !canvas.contains(raw) {
                report.outside_canvas += 1;
            }
            if !zones.zone(category).contains(placed) {
                report.outside_zone += 1;
            }
            if zones.constrain(category, placed) != placed {
                report.not_idempotent += 1;
            }
        }
    }

    for count in 1..=config.limits.max_root_issues {
        let grid = allocator.root_issue_grid(count);
        let distinct: HashSet<(u64, u64)> = grid.iter().map(|p: &Point| (p.x.to_bits(), p.y.to_bits())).collect();
        if distinct.len() != grid.len() {
            report.overlapping_grids += 1;
        }
    }

    tracing::info!(
        samples = report.samples,
        outside_canvas = report.outside_canvas,
        outside_zone = report.outside_zone,
        "layout sample finished"
    );
    report
}
