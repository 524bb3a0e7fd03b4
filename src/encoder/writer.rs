//! Dataset writer: `index.json` plus one blob per array.

use serde_json::{json, Map, Value};
use tracing::debug;

use super::blob::encode_blob;
use crate::archive::ArchiveSink;
use crate::dataset::{AttributeRole, DataArray, DataObject, DataSetAttributes, ImageData, PolyData};
use crate::util::{Error, Result};

/// Directory (relative to the dataset root) holding array blobs.
pub const DATA_DIR: &str = "data";

/// Name of the per-dataset manifest.
pub const INDEX_FILE: &str = "index.json";

/// Writes one dataset into an archive sink.
///
/// Blobs are content addressed: an array whose identifier is already present
/// in the sink is referenced, not stored again.
pub struct DataSetWriter<'a> {
    archive: &'a mut dyn ArchiveSink,
    invalid_names: usize,
    valid: bool,
    blobs_written: usize,
    blobs_reused: usize,
}

impl<'a> DataSetWriter<'a> {
    pub fn new(archive: &'a mut dyn ArchiveSink) -> Self {
        Self {
            archive,
            invalid_names: 0,
            valid: true,
            blobs_written: 0,
            blobs_reused: 0,
        }
    }

    /// False after `write` rejected its dataset.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Blobs inserted into the sink by this writer.
    pub fn blobs_written(&self) -> usize {
        self.blobs_written
    }

    /// Blobs skipped because the sink already held them.
    pub fn blobs_reused(&self) -> usize {
        self.blobs_reused
    }

    /// Name for arrays without one: `invalid_0`, `invalid_1`, ...
    fn valid_name(&mut self, name: Option<&str>) -> String {
        match name {
            Some(n) => n.to_string(),
            None => {
                let n = format!("invalid_{}", self.invalid_names);
                self.invalid_names += 1;
                n
            }
        }
    }

    /// Store `array` as `data/<id>` and return its manifest fragment.
    ///
    /// Bit arrays cannot be represented and return `Ok(None)`.
    pub fn encode_array(
        &mut self,
        array: &DataArray,
        class_name: &str,
        custom_name: Option<&str>,
    ) -> Result<Option<Value>> {
        let Some(blob) = encode_blob(array) else {
            debug!("skipping bit array {:?}", array.name());
            return Ok(None);
        };

        let path = format!("{DATA_DIR}/{}", blob.id);
        if self.archive.contains(&path) {
            self.blobs_reused += 1;
        } else {
            self.archive.insert(&path, &blob.bytes)?;
            self.blobs_written += 1;
        }

        let name = self.valid_name(custom_name.or(array.name()));
        Ok(Some(json!({
            "vtkClass": class_name,
            "name": name,
            "numberOfComponents": array.components(),
            "dataType": blob.kind.js_array_name(),
            "ref": {
                "encode": "LittleEndian",
                "basepath": DATA_DIR,
                "id": blob.id,
            },
            "size": blob.size,
        })))
    }

    /// Write `index.json` and every blob of `data`.
    pub fn write(&mut self, data: &DataObject) -> Result<()> {
        let mut doc = Map::new();
        doc.insert("vtkClass".into(), json!(data.class_name()));

        let (point_data, cell_data) = match data {
            DataObject::PolyData(pd) if pd.is_valid() => {
                self.write_poly_geometry(pd, &mut doc)?;
                (&pd.point_data, &pd.cell_data)
            }
            DataObject::ImageData(img) if img.is_valid() => {
                write_image_geometry(img, &mut doc);
                (&img.point_data, &img.cell_data)
            }
            other => {
                self.valid = false;
                return Err(Error::invalid(format!(
                    "{} has neither points nor image geometry",
                    other.class_name()
                )));
            }
        };

        let pd_json = self.encode_attributes(point_data)?;
        doc.insert("pointData".into(), pd_json);
        let cd_json = self.encode_attributes(cell_data)?;
        doc.insert("cellData".into(), cd_json);

        let bytes = serde_json::to_vec_pretty(&Value::Object(doc))?;
        self.archive.insert(INDEX_FILE, &bytes)
    }

    fn write_poly_geometry(&mut self, pd: &PolyData, doc: &mut Map<String, Value>) -> Result<()> {
        if let Some(points) = pd.points() {
            if let Some(frag) = self.encode_array(points, "vtkPoints", Some("points"))? {
                doc.insert("points".into(), frag);
            }
        }
        for (key, cells) in [
            ("verts", &pd.verts),
            ("lines", &pd.lines),
            ("polys", &pd.polys),
            ("strips", &pd.strips),
        ] {
            if cells.is_empty() {
                continue;
            }
            let array = cells.legacy_array(key);
            if let Some(frag) = self.encode_array(&array, "vtkCellArray", Some(key))? {
                doc.insert(key.into(), frag);
            }
        }
        Ok(())
    }

    fn encode_attributes(&mut self, attrs: &DataSetAttributes) -> Result<Value> {
        let mut arrays = Vec::with_capacity(attrs.len());
        let mut active = [-1i64; 7];

        for (idx, array) in attrs.arrays().iter().enumerate() {
            let Some(frag) = self.encode_array(array, "vtkDataArray", None)? else {
                continue;
            };
            for (slot, role) in AttributeRole::ALL.iter().enumerate() {
                if attrs.active_index(*role) == Some(idx) {
                    active[slot] = arrays.len() as i64;
                }
            }
            arrays.push(json!({ "data": frag }));
        }

        let mut block = Map::new();
        block.insert("vtkClass".into(), json!("vtkDataSetAttributes"));
        for (slot, role) in AttributeRole::ALL.iter().enumerate() {
            block.insert(role.manifest_key().into(), json!(active[slot]));
        }
        block.insert("arrays".into(), Value::Array(arrays));
        Ok(Value::Object(block))
    }
}

fn write_image_geometry(img: &ImageData, doc: &mut Map<String, Value>) {
    doc.insert("spacing".into(), json!(img.spacing));
    doc.insert("origin".into(), json!(img.origin));
    doc.insert("extent".into(), json!(img.extent()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{zip::read_entries, BufferedArchive, PartitionedArchive};
    use crate::dataset::sources;

    fn read_index(archive: &PartitionedArchive) -> Value {
        let entries = read_entries(archive.buffer(INDEX_FILE).unwrap()).unwrap();
        serde_json::from_slice(&entries[0].data).unwrap()
    }

    #[test]
    fn test_same_array_stored_once() -> Result<()> {
        let mut archive = PartitionedArchive::new();
        let array = DataArray::from_f32("a", 1, vec![1.0, 2.0]);
        let (first, second) = {
            let mut writer = DataSetWriter::new(&mut archive);
            let first = writer.encode_array(&array, "vtkDataArray", None)?.unwrap();
            let second = writer.encode_array(&array, "vtkDataArray", None)?.unwrap();
            assert_eq!(writer.blobs_written(), 1);
            assert_eq!(writer.blobs_reused(), 1);
            (first, second)
        };
        assert_eq!(first["ref"]["id"], second["ref"]["id"]);
        assert_eq!(archive.number_of_buffers(), 1);
        let id = first["ref"]["id"].as_str().unwrap();
        assert!(archive.contains(&format!("data/{id}")));
        Ok(())
    }

    #[test]
    fn test_unnamed_arrays_get_invalid_names() -> Result<()> {
        let mut archive = PartitionedArchive::new();
        let mut writer = DataSetWriter::new(&mut archive);
        let unnamed = DataArray::new(None, 1, crate::dataset::ArrayValues::Uint8(vec![1]));
        let a = writer.encode_array(&unnamed, "vtkDataArray", None)?.unwrap();
        let b = writer.encode_array(&unnamed, "vtkDataArray", None)?.unwrap();
        assert_eq!(a["name"], "invalid_0");
        assert_eq!(b["name"], "invalid_1");
        Ok(())
    }

    #[test]
    fn test_polydata_manifest() -> Result<()> {
        let mut pd = sources::plane(1.0, 2, 2);
        pd.cell_data.add_array(DataArray::from_bits("mask", &[true; 8]));
        pd.cell_data
            .add_active(AttributeRole::Scalars, DataArray::from_i64("cellIds", 1, (0..8).collect()));

        let mut archive = PartitionedArchive::new();
        DataSetWriter::new(&mut archive).write(&pd.into())?;

        let index = read_index(&archive);
        assert_eq!(index["vtkClass"], "vtkPolyData");
        assert_eq!(index["points"]["vtkClass"], "vtkPoints");
        assert_eq!(index["points"]["dataType"], "Float32Array");
        assert_eq!(index["polys"]["dataType"], "Int32Array");
        assert_eq!(index["polys"]["size"], 8 * 4);
        assert!(index.get("verts").is_none());
        assert!(index.get("strips").is_none());

        assert_eq!(index["pointData"]["activeTCoords"], 0);
        assert_eq!(index["pointData"]["activeScalars"], -1);

        // The bit array takes no slot, so the narrowed ids land at position 0
        let cell_arrays = index["cellData"]["arrays"].as_array().unwrap();
        assert_eq!(cell_arrays.len(), 1);
        assert_eq!(cell_arrays[0]["data"]["dataType"], "Int32Array");
        assert_eq!(index["cellData"]["activeScalars"], 0);
        Ok(())
    }

    #[test]
    fn test_image_manifest() -> Result<()> {
        let mut img = sources::checkerboard(4, 2, 1);
        img.spacing = [0.5, 0.5, 1.0];
        let mut archive = BufferedArchive::new("img");
        archive.open()?;
        DataSetWriter::new(&mut archive).write(&img.into())?;
        archive.close()?;

        let entries = read_entries(archive.buffer().unwrap())?;
        let index = entries.iter().find(|e| e.name == INDEX_FILE).unwrap();
        let index: Value = serde_json::from_slice(&index.data)?;
        assert_eq!(index["vtkClass"], "vtkImageData");
        assert_eq!(index["extent"], json!([0, 3, 0, 1, 0, 0]));
        assert_eq!(index["spacing"], json!([0.5, 0.5, 1.0]));
        assert_eq!(index["pointData"]["arrays"][0]["data"]["dataType"], "Uint8Array");
        Ok(())
    }

    #[test]
    fn test_invalid_dataset_rejected() {
        let mut archive = PartitionedArchive::new();
        let mut writer = DataSetWriter::new(&mut archive);
        let err = writer.write(&PolyData::new().into());
        assert!(matches!(err, Err(Error::InvalidDataSet(_))));
        assert!(!writer.is_valid());
        drop(writer);
        assert_eq!(archive.number_of_buffers(), 0);
    }
}
