//! Scene export to a web-viewer package.
//!
//! Layout written into the sink:
//! - `index.json` - root manifest listing every exported dataset
//! - `<n>/index.json`, `<n>/data/<id>` - one dataset per drawn leaf
//! - `<n>.png` or `<n>_<k>-<w>x<h>.png` - textures
//! - `sourceLOD_<n>_<round>.zip` - larger polygon levels

mod options;

pub use options::ExportOptions;

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveSink, SubArchive};
use crate::dataset::DataObject;
use crate::encoder::{DataSetWriter, INDEX_FILE};
use crate::lod::{encode_png, PolyLodGenerator, TextureLodGenerator};
use crate::scene::{Actor, BlockDisplay, Camera, Handle, LookupTable, Mapper, MapperKind, Scene};
use crate::util::{DQuat, Error, EulerRot, Result};

/// Root manifest format version.
pub const MANIFEST_VERSION: f64 = 1.0;

/// Counts of what an export produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub datasets_written: usize,
    pub datasets_skipped: usize,
    pub textures_written: usize,
    pub texture_lod_steps: usize,
    pub poly_lod_steps: usize,
}

impl ExportStats {
    /// Files and series steps written, excluding manifests and blobs.
    pub fn total_artifacts(&self) -> usize {
        self.datasets_written + self.textures_written + self.texture_lod_steps + self.poly_lod_steps
    }
}

/// Writes a [`Scene`] into an [`ArchiveSink`].
#[derive(Debug, Clone, Default)]
pub struct SceneExporter {
    options: ExportOptions,
}

/// Per-export state.
#[derive(Default)]
struct ExportRun {
    stats: ExportStats,
    dataset_count: usize,
    entries: Vec<Value>,
    textures: HashMap<Handle, Option<(&'static str, Value)>>,
    lookup_tables: Map<String, Value>,
}

impl SceneExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export every visible actor of the scene's main window.
    ///
    /// Datasets that cannot be encoded are skipped and counted; only a
    /// missing window or an unusable sink fail the export.
    pub fn export(&self, scene: &Scene, sink: &mut dyn ArchiveSink) -> Result<ExportStats> {
        let Some(window) = scene.window() else {
            error!("scene has no render window, nothing exported");
            return Err(Error::NullInput("render window".into()));
        };
        sink.open()?;

        let mut run = ExportRun::default();
        let renderers = scene.renderers();
        for &r in &renderers {
            let Some(renderer) = scene.renderer(r) else {
                continue;
            };
            for &prop in &renderer.props {
                let Some(actor) = scene.actor(prop) else {
                    debug!("prop {prop} is not an actor, skipped");
                    continue;
                };
                if !actor.visibility {
                    continue;
                }
                self.export_actor(scene, actor, &mut run, sink)?;
            }
        }

        let root = root_manifest(scene, &renderers, run.entries, run.lookup_tables);
        sink.insert(INDEX_FILE, &serde_json::to_vec_pretty(&root)?)?;
        sink.close()?;

        info!(
            window = %window,
            datasets = run.stats.datasets_written,
            skipped = run.stats.datasets_skipped,
            textures = run.stats.textures_written,
            "scene exported"
        );
        Ok(run.stats)
    }

    fn export_actor(&self, scene: &Scene, actor: &Actor, run: &mut ExportRun, sink: &mut dyn ArchiveSink) -> Result<()> {
        let Some(mapper) = actor.mapper.and_then(|m| scene.mapper(m)) else {
            return Ok(());
        };
        let Some(input) = mapper.input.and_then(|h| scene.data(h)) else {
            return Ok(());
        };
        if matches!(mapper.kind, MapperKind::Glyph(_)) {
            debug!("glyph mappers have no scene index entry, skipped");
            run.stats.datasets_skipped += 1;
            return Ok(());
        }

        match input {
            DataObject::MultiBlock(mb) => {
                let overrides = match &mapper.kind {
                    MapperKind::Composite(cda) => Some(cda),
                    _ => None,
                };
                for (block, leaf) in mb.leaves() {
                    let display = overrides.and_then(|cda| cda.block(block));
                    if display.and_then(|d| d.visibility) == Some(false) || leaf.is_empty() {
                        continue;
                    }
                    self.export_dataset(scene, actor, mapper, leaf, display, run, sink)?;
                }
                Ok(())
            }
            leaf => self.export_dataset(scene, actor, mapper, leaf, None, run, sink),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn export_dataset(
        &self,
        scene: &Scene,
        actor: &Actor,
        mapper: &Mapper,
        data: &DataObject,
        display: Option<&BlockDisplay>,
        run: &mut ExportRun,
        sink: &mut dyn ArchiveSink,
    ) -> Result<()> {
        let valid = match data {
            DataObject::PolyData(pd) => pd.is_valid(),
            DataObject::ImageData(img) => img.is_valid(),
            DataObject::MultiBlock(_) => false,
        };
        if !valid {
            warn!("{} without geometry skipped", data.class_name());
            run.stats.datasets_skipped += 1;
            return Ok(());
        }

        run.dataset_count += 1;
        let index = run.dataset_count;
        let name = index.to_string();

        // Polygon LODs replace the dataset with its final, smallest level.
        let mut source_lods = None;
        let mut reduced = None;
        if let (true, DataObject::PolyData(pd)) = (self.options.write_poly_lods, data) {
            let generator = PolyLodGenerator::new(self.options.poly_lod_base_size)
                .with_max_attempts(self.options.poly_lod_max_attempts);
            match generator.generate(pd, index, sink) {
                Ok(out) if !out.series.is_empty() => {
                    run.stats.poly_lod_steps += out.series.len();
                    source_lods = Some(out.series.manifest(&self.options.poly_lods_base_url));
                    reduced = Some(DataObject::PolyData(out.mesh));
                }
                Ok(_) => {}
                Err(e) if e.is_fatal_for_sink() => return Err(e),
                Err(e) => warn!("polygon LODs for dataset {name} not written: {e}"),
            }
        }
        let data = reduced.as_ref().unwrap_or(data);

        let written = {
            let mut sub = SubArchive::new(&mut *sink, name.as_str());
            let mut writer = DataSetWriter::new(&mut sub);
            writer.write(data)
        };
        match written {
            Ok(()) => run.stats.datasets_written += 1,
            Err(e) if e.is_fatal_for_sink() => return Err(e),
            Err(e) => {
                warn!("dataset {name} not written: {e}");
                run.stats.datasets_skipped += 1;
                return Ok(());
            }
        }

        let mut entry = Map::new();
        entry.insert("name".into(), json!(name));
        match source_lods {
            Some(lods) => {
                entry.insert("type".into(), json!("httpDataSetLODsReader"));
                entry.insert(
                    "httpDataSetLODsReader".into(),
                    json!({ "url": name, "sourceLODs": lods }),
                );
            }
            None => {
                entry.insert("type".into(), json!("httpDataSetReader"));
                entry.insert("httpDataSetReader".into(), json!({ "url": name }));
            }
        }
        entry.insert(
            "actor".into(),
            json!({
                "origin": actor.origin,
                "scale": actor.scale,
                "position": actor.position,
            }),
        );
        entry.insert("actorRotation".into(), json!(actor_rotation(actor.orientation)));
        entry.insert(
            "mapper".into(),
            json!({
                "colorByArrayName": mapper.color_by_array_name.as_deref().unwrap_or(""),
                "colorMode": mapper.color_mode as u8,
                "scalarMode": mapper.scalar_mode as u8,
            }),
        );
        entry.insert("property".into(), property_json(actor, display));

        if let Some(texture) = actor.texture {
            if let Some((key, value)) = self.export_texture(scene, texture, &name, run, sink)? {
                entry.insert(key.into(), value);
            }
        }

        if let (Some(array), Some(lut)) = (
            mapper.color_by_array_name.as_ref(),
            mapper.lookup_table.and_then(|h| scene.lookup_table(h)),
        ) {
            if !run.lookup_tables.contains_key(array) {
                run.lookup_tables.insert(array.clone(), lookup_table_json(lut));
            }
        }

        run.entries.push(Value::Object(entry));
        Ok(())
    }

    /// Write a texture once per handle and return its manifest entry.
    fn export_texture(
        &self,
        scene: &Scene,
        texture: Handle,
        name: &str,
        run: &mut ExportRun,
        sink: &mut dyn ArchiveSink,
    ) -> Result<Option<(&'static str, Value)>> {
        if !self.options.write_textures {
            return Ok(None);
        }
        if let Some(memo) = run.textures.get(&texture) {
            return Ok(memo.clone());
        }

        let image = scene
            .texture_image(texture)
            .and_then(DataObject::as_image_data)
            .and_then(|img| img.to_rgba_image());
        let Some(image) = image else {
            debug!("texture {texture} has no RGBA image, skipped");
            run.textures.insert(texture, None);
            return Ok(None);
        };

        let result = if self.options.write_texture_lods {
            TextureLodGenerator::new(self.options.texture_lod_base_size)
                .generate(&image, name, sink)
                .map(|series| {
                    run.stats.texture_lod_steps += series.len();
                    ("textureLODs", series.manifest(&self.options.texture_lods_base_url))
                })
        } else {
            let file = format!("{name}.png");
            encode_png(&image).and_then(|png| sink.insert(&file, &png)).map(|()| {
                run.stats.textures_written += 1;
                ("texture", json!(file))
            })
        };

        let memo = match result {
            Ok(entry) => Some(entry),
            Err(e) if e.is_fatal_for_sink() => return Err(e),
            Err(e) => {
                warn!("texture {texture} not written: {e}");
                None
            }
        };
        run.textures.insert(texture, memo.clone());
        Ok(memo)
    }
}

/// Actor orientation (degrees, applied z, x, y) as a `[w, x, y, z]` quaternion.
pub fn actor_rotation(orientation: [f64; 3]) -> [f64; 4] {
    let [x, y, z] = orientation.map(f64::to_radians);
    let q = DQuat::from_euler(EulerRot::YXZ, y, x, z);
    [q.w, q.x, q.y, q.z]
}

fn property_json(actor: &Actor, display: Option<&BlockDisplay>) -> Value {
    let p = &actor.property;
    let color = display.and_then(|d| d.color).unwrap_or(p.diffuse_color);
    let opacity = display.and_then(|d| d.opacity).unwrap_or(p.opacity);
    json!({
        "representation": p.representation as u8,
        "edgeVisibility": u8::from(p.edge_visibility),
        "diffuseColor": color,
        "pointSize": p.point_size,
        "opacity": opacity,
    })
}

fn lookup_table_json(lut: &LookupTable) -> Value {
    let table: Vec<[u8; 4]> = lut.build();
    json!({
        "range": lut.range,
        "nanColor": lut.nan_color,
        "numberOfColors": table.len(),
        "table": table,
    })
}

fn root_manifest(scene: &Scene, renderers: &[Handle], entries: Vec<Value>, lookup_tables: Map<String, Value>) -> Value {
    let renderer = renderers.iter().find_map(|&r| scene.renderer(r));
    let camera = renderer
        .and_then(|r| r.active_camera)
        .and_then(|c| scene.camera(c))
        .cloned()
        .unwrap_or_else(Camera::default);
    let background = renderer.map_or([0.0; 3], |r| r.background);
    let center = renderer
        .and_then(|r| r.center_of_rotation)
        .unwrap_or(camera.focal_point);

    json!({
        "version": MANIFEST_VERSION,
        "background": background,
        "camera": {
            "focalPoint": camera.focal_point,
            "position": camera.position,
            "viewUp": camera.view_up,
        },
        "centerOfRotation": center,
        "scene": entries,
        "lookupTables": lookup_tables,
    })
}
