//! # scenepack
//!
//! Publishes 3D scenes as static packages for web viewers: a root
//! `index.json`, one content-addressed dataset directory per drawn object,
//! textures, and optional level-of-detail series.
//!
//! ## Modules
//!
//! - [`util`] - Errors, array kinds, math
//! - [`archive`] - Sinks the export writes into (directory, zip buffers)
//! - [`dataset`] - Poly and image datasets with attribute arrays
//! - [`encoder`] - Dataset manifests and content-addressed blobs
//! - [`scene`] - Arena of windows, renderers, actors, mappers, ...
//! - [`serializer`] - Scene graph document with construction calls
//! - [`lod`] - Texture pyramids and polygon decimation
//! - [`exporter`] - Whole-scene export driver
//!
//! ## Example
//!
//! ```ignore
//! use scenepack::prelude::*;
//!
//! let mut sink = DirectoryArchive::new("out");
//! let stats = SceneExporter::new(ExportOptions::default()).export(&scene, &mut sink)?;
//! println!("{} datasets", stats.datasets_written);
//! ```

pub mod archive;
pub mod dataset;
pub mod encoder;
pub mod exporter;
pub mod lod;
pub mod scene;
pub mod serializer;
pub mod util;

pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archive::{ArchiveSink, BufferedArchive, DirectoryArchive, PartitionedArchive, SubArchive};
    pub use crate::dataset::{AttributeRole, DataArray, DataObject, ImageData, MultiBlock, PolyData};
    pub use crate::encoder::DataSetWriter;
    pub use crate::exporter::{ExportOptions, ExportStats, SceneExporter};
    pub use crate::scene::*;
    pub use crate::serializer::SceneGraphSerializer;
    pub use crate::util::{Error, Result};
}
