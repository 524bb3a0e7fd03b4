//! Progressive mesh decimation into zipped source LODs.

use tracing::{debug, info, warn};

use super::{DivisorSearch, LodSeries, LodStep, QuadricClustering, MAX_ATTEMPTS};
use crate::archive::{ArchiveSink, BufferedArchive};
use crate::dataset::{DataObject, PolyData};
use crate::encoder::DataSetWriter;
use crate::util::{Error, Result};

/// Rounds whose footprint shrinks by less than this fraction end the series.
pub const MIN_REDUCTION: f64 = 0.05;

/// Smallest aspect ratio handed to the divisor search.
const MIN_ASPECT: f64 = 0.01;

/// Output of [`PolyLodGenerator::generate`].
#[derive(Clone, Debug)]
pub struct PolyLodResult {
    /// Mesh to encode as the primary dataset.
    pub mesh: PolyData,
    /// Persisted larger levels, largest first.
    pub series: LodSeries,
}

/// Decimates a mesh round by round until it fits under `base_size`.
#[derive(Clone, Debug)]
pub struct PolyLodGenerator {
    base_size: usize,
    max_attempts: usize,
}

impl PolyLodGenerator {
    pub fn new(base_size: usize) -> Self {
        Self {
            base_size,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    /// One decimation round: tune the grid towards a quarter of the footprint.
    pub fn decimate(&self, mesh: &PolyData) -> Result<PolyData> {
        let aspect = mesh.bounds().aspect_ratios(MIN_ASPECT);
        let search = DivisorSearch::new(mesh.num_points(), aspect).with_max_attempts(self.max_attempts);
        let outcome = search.run(mesh.memory_size(), |divisions| {
            let out = QuadricClustering::new(divisions).apply(mesh)?;
            let size = out.memory_size();
            Ok((out, size))
        })?;
        debug!(
            status = ?outcome.status,
            attempts = outcome.attempts,
            divisions = ?outcome.divisions,
            size = outcome.size,
            "decimation round"
        );
        Ok(outcome.result)
    }

    /// Decimate `mesh`, writing every level above the final one as
    /// `sourceLOD_<dataset_index>_<round>.zip`.
    ///
    /// Only sink-fatal errors are returned. Other write failures end the
    /// series early with what was stored so far.
    pub fn generate(&self, mesh: &PolyData, dataset_index: usize, sink: &mut dyn ArchiveSink) -> Result<PolyLodResult> {
        let mut series = LodSeries::new();
        let mut current = DataObject::PolyData(mesh.clone());

        for round in 0.. {
            let Some(pd) = current.as_poly_data() else {
                break;
            };
            let footprint = pd.memory_size();
            if footprint <= self.base_size {
                break;
            }

            let next = match self.decimate(pd) {
                Ok(next) => next,
                Err(e @ Error::Allocation(_)) => {
                    warn!("decimation of dataset {dataset_index} failed: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };
            let reduction = 1.0 - next.memory_size() as f64 / footprint as f64;
            if reduction < MIN_REDUCTION {
                debug!(round, reduction, "diminishing returns, LOD series ends");
                break;
            }

            // A step that cannot be stored ends the series; steps already in
            // the sink stay listed and the unstored level becomes the final mesh.
            let name = format!("sourceLOD_{dataset_index}_{round}.zip");
            let stored = zip_dataset(&name, &current).and_then(|bytes| {
                sink.insert(&name, &bytes)?;
                Ok(bytes)
            });
            let bytes = match stored {
                Ok(bytes) => bytes,
                Err(e) if e.is_fatal_for_sink() => return Err(e),
                Err(e) => {
                    warn!("{name} not written, LOD series ends: {e}");
                    break;
                }
            };
            series.push(LodStep {
                name,
                size: bytes.len(),
                footprint,
            });
            current = DataObject::PolyData(next);
        }

        let mesh = match current {
            DataObject::PolyData(pd) => pd,
            _ => mesh.clone(),
        };
        info!(
            dataset = dataset_index,
            steps = series.len(),
            final_size = mesh.memory_size(),
            "polygon LOD series"
        );
        Ok(PolyLodResult { mesh, series })
    }
}

/// Dataset export (`index.json` + `data/`) as one zip.
fn zip_dataset(name: &str, data: &DataObject) -> Result<Vec<u8>> {
    let mut zip = BufferedArchive::new(name);
    zip.open()?;
    DataSetWriter::new(&mut zip).write(data)?;
    zip.close()?;
    zip.into_buffer()
        .ok_or_else(|| Error::Zip(format!("{name} produced no buffer")))
}
