//! Level-of-detail series for textures and polygon meshes.
//!
//! Both generators work largest-first and write every step through an
//! [`ArchiveSink`](crate::archive::ArchiveSink). A [`LodSeries`] records what
//! was written; manifests list it smallest-first so viewers can start with
//! the cheapest step.

mod cluster;
mod poly;
mod search;
mod texture;

pub use cluster::QuadricClustering;
pub use poly::{PolyLodGenerator, PolyLodResult, MIN_REDUCTION};
pub use search::{DivisorSearch, SearchOutcome, SearchStatus, DEFAULT_DIVISIONS, DIVISION_CEILING, MAX_ATTEMPTS};
pub use texture::{encode_png, TextureLodGenerator};

use serde_json::{json, Value};

/// One written artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LodStep {
    /// Path of the artifact inside the archive.
    pub name: String,
    /// Bytes written.
    pub size: usize,
    /// In-memory footprint of the data the step encodes.
    pub footprint: usize,
}

/// Steps in generation order (largest first).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LodSeries {
    steps: Vec<LodStep>,
}

impl LodSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: LodStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[LodStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Total bytes written.
    pub fn total_size(&self) -> usize {
        self.steps.iter().map(|s| s.size).sum()
    }

    /// `[{url, size}]`, smallest first.
    pub fn manifest(&self, base_url: &str) -> Value {
        let entries: Vec<Value> = self
            .steps
            .iter()
            .rev()
            .map(|s| json!({ "url": join_url(base_url, &s.name), "size": s.size }))
            .collect();
        Value::Array(entries)
    }
}

fn join_url(base: &str, name: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
