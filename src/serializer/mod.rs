//! Scene graph document for remote reconstruction.
//!
//! The serializer walks a [`Scene`] and emits one JSON tree of nodes
//! `{id, parent, type, properties, dependencies, calls}`. Calls are
//! `[method, [args...]]` pairs whose node arguments read `instance:${<id>}`,
//! so a remote interpreter can rebuild the scene by replaying them.
//!
//! Identifiers are assigned once per [`NodeKey`]: a texture shared by two
//! actors is defined once and referenced by both.

mod convert;

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::dataset::{DataArray, DataObject, DataSetAttributes};
use crate::archive::ArchiveSink;
use crate::encoder::{encode_blob, DATA_DIR, INDEX_FILE};
use crate::scene::{
    Actor, CompositeDisplayAttributes, ElementKind, Handle, Mapper, MapperKind, Scene,
    SceneElement,
};
use crate::util::{Error, Result};

use convert::Properties;

/// Part of a fabricated composite leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeafPart {
    Actor,
    Property,
    Mapper,
    Data,
}

/// Identity of a node in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Element(Handle),
    /// Surface property owned by an actor.
    ActorProperty(Handle),
    /// Node built for one leaf block of a composite mapper.
    Fabricated {
        mapper: Handle,
        block: usize,
        part: LeafPart,
    },
}

#[derive(Debug)]
struct Node {
    id: String,
    parent: Option<String>,
    type_name: &'static str,
    properties: Properties,
    dependencies: Vec<usize>,
    calls: Vec<Value>,
}

/// Reference argument for a call.
pub fn instance_ref(id: &str) -> String {
    format!("instance:${{{id}}}")
}

/// Method a parent uses to attach a child of the given kind.
pub fn construction_call(parent: ElementKind, child: ElementKind) -> Option<&'static str> {
    use ElementKind::*;
    Some(match (parent, child) {
        (Window, Renderer) => "addRenderer",
        (Renderer, Camera) => "setActiveCamera",
        (Renderer, Light) => "addLight",
        (Renderer, Actor) => "addViewProp",
        (Actor, Mapper) => "setMapper",
        (Actor, Texture) => "addTexture",
        (Actor, Transform) => "setUserTransform",
        (Mapper, LookupTable) => "setLookupTable",
        (Mapper, Data) | (Texture, Data) => "setInputData",
        _ => return None,
    })
}

/// Builds the scene graph document.
#[derive(Debug, Default)]
pub struct SceneGraphSerializer {
    next_id: u64,
    index: HashMap<NodeKey, usize>,
    nodes: Vec<Node>,
    root: Option<usize>,
    data_objects: Vec<(String, DataObject)>,
    arrays: Vec<(String, DataArray)>,
    known_arrays: HashSet<String>,
}

impl SceneGraphSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier assigned to `key`, if it has been serialized.
    pub fn id_of(&self, key: NodeKey) -> Option<&str> {
        self.index.get(&key).map(|&i| self.nodes[i].id.as_str())
    }

    /// `(node id, dataset)` for every dataset node, in emission order.
    pub fn data_objects(&self) -> &[(String, DataObject)] {
        &self.data_objects
    }

    /// `(blob id, array)` for every distinct array referenced by a dataset node.
    pub fn arrays(&self) -> &[(String, DataArray)] {
        &self.arrays
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Seed the document with the window node and return its id.
    pub fn serialize_window(&mut self, scene: &Scene, window: Handle) -> Result<String> {
        let w = scene
            .render_window(window)
            .ok_or_else(|| Error::NullInput(format!("{window} is not a render window")))?;
        let key = NodeKey::Element(window);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.create(key, None);
                let (ty, props) = convert::window(w);
                self.set(idx, ty, props);
                idx
            }
        };
        self.root = Some(idx);
        Ok(self.nodes[idx].id.clone())
    }

    /// Serialize `handle` under the already serialized `parent`.
    ///
    /// Returns the node id, or `None` when the element produced no node of
    /// its own (a flattened composite actor, a rejected glyph mapper).
    pub fn add_node(&mut self, scene: &Scene, parent: Handle, handle: Handle) -> Result<Option<String>> {
        let parent_idx = *self
            .index
            .get(&NodeKey::Element(parent))
            .ok_or_else(|| Error::NullInput(format!("parent {parent} is not serialized")))?;
        let parent_kind = scene
            .kind(parent)
            .ok_or_else(|| Error::NullInput(format!("no element {parent}")))?;
        let kind = scene
            .kind(handle)
            .ok_or_else(|| Error::NullInput(format!("no element {handle}")))?;
        let method = construction_call(parent_kind, kind)
            .ok_or_else(|| Error::other(format!("cannot attach {kind:?} to {parent_kind:?}")))?;

        let idx = self.attach_element(scene, parent_idx, handle, method, None)?;
        Ok(idx.map(|i| self.nodes[i].id.clone()))
    }

    /// Walk the main window: renderers, then each renderer's camera, lights
    /// and props. Returns the document.
    pub fn serialize_scene(&mut self, scene: &Scene) -> Result<Value> {
        let window = scene
            .window()
            .ok_or_else(|| Error::NullInput("scene has no render window".into()))?;
        self.serialize_window(scene, window)?;

        for r in scene.renderers() {
            self.add_node(scene, window, r)?;
            let Some(renderer) = scene.renderer(r) else {
                continue;
            };
            if let Some(cam) = renderer.active_camera {
                self.add_node(scene, r, cam)?;
            }
            for &light in &renderer.lights {
                self.add_node(scene, r, light)?;
            }
            for &prop in &renderer.props {
                self.add_node(scene, r, prop)?;
            }
        }
        debug!(nodes = self.nodes.len(), datasets = self.data_objects.len(), "scene serialized");
        Ok(self.to_json())
    }

    /// Store the document as `index.json` and every referenced array as
    /// `data/<hash>`, skipping blobs the sink already holds.
    ///
    /// Opens and closes `sink`. Returns the number of blobs inserted.
    pub fn publish(&self, sink: &mut dyn ArchiveSink) -> Result<usize> {
        if self.root.is_none() {
            return Err(Error::NullInput("no window serialized".into()));
        }
        sink.open()?;

        let mut stored = 0;
        for (id, array) in &self.arrays {
            let Some(blob) = encode_blob(array) else {
                continue;
            };
            let path = format!("{DATA_DIR}/{id}");
            if sink.contains(&path) {
                continue;
            }
            sink.insert(&path, &blob.bytes)?;
            stored += 1;
        }
        sink.insert(INDEX_FILE, &serde_json::to_vec_pretty(&self.to_json())?)?;
        sink.close()?;

        info!(nodes = self.nodes.len(), blobs = stored, "scene graph published");
        Ok(stored)
    }

    /// The document rooted at the window node, `null` before `serialize_window`.
    pub fn to_json(&self) -> Value {
        self.root.map_or(Value::Null, |r| self.node_json(r))
    }

    fn node_json(&self, idx: usize) -> Value {
        let node = &self.nodes[idx];
        let deps: Vec<Value> = node.dependencies.iter().map(|&d| self.node_json(d)).collect();
        json!({
            "id": node.id,
            "parent": node.parent,
            "type": node.type_name,
            "properties": node.properties,
            "dependencies": deps,
            "calls": node.calls,
        })
    }

    fn create(&mut self, key: NodeKey, parent: Option<usize>) -> usize {
        self.next_id += 1;
        let idx = self.nodes.len();
        let parent = parent.map(|p| self.nodes[p].id.clone());
        self.nodes.push(Node {
            id: self.next_id.to_string(),
            parent,
            type_name: "",
            properties: Properties::new(),
            dependencies: Vec::new(),
            calls: Vec::new(),
        });
        self.index.insert(key, idx);
        idx
    }

    fn set(&mut self, idx: usize, type_name: &'static str, properties: Properties) {
        let node = &mut self.nodes[idx];
        node.type_name = type_name;
        node.properties = properties;
    }

    /// Look up or create `key` under `parent` and record the call.
    ///
    /// A new node joins the parent's dependencies; a known one only gains
    /// the call. Returns the node index and whether it was created.
    fn attach(&mut self, parent: usize, key: NodeKey, method: &str, port: Option<u32>) -> (usize, bool) {
        let (idx, created) = match self.index.get(&key) {
            Some(&idx) => (idx, false),
            None => {
                let idx = self.create(key, Some(parent));
                self.nodes[parent].dependencies.push(idx);
                (idx, true)
            }
        };
        let mut args = vec![json!(instance_ref(&self.nodes[idx].id))];
        if let Some(port) = port {
            args.push(json!(port));
        }
        self.nodes[parent].calls.push(json!([method, args]));
        (idx, created)
    }

    fn attach_element(
        &mut self,
        scene: &Scene,
        parent: usize,
        handle: Handle,
        method: &str,
        port: Option<u32>,
    ) -> Result<Option<usize>> {
        let element = scene
            .get(handle)
            .ok_or_else(|| Error::NullInput(format!("no element {handle}")))?;

        match element {
            SceneElement::Actor(actor) => {
                if let Some((mapper_h, mapper, cda)) = composite_mapper(scene, actor) {
                    self.flatten_composite(scene, parent, actor, mapper_h, mapper, cda)?;
                    return Ok(None);
                }
            }
            SceneElement::Mapper(mapper) if glyph_has_composite(scene, mapper) => {
                warn!("glyph mapper {handle} has a composite input or source, skipped");
                return Ok(None);
            }
            SceneElement::Data(data) if data.is_composite() => {
                debug!("composite dataset {handle} needs a composite mapper, skipped");
                return Ok(None);
            }
            _ => {}
        }

        let (idx, created) = self.attach(parent, NodeKey::Element(handle), method, port);
        if created {
            self.fill(scene, idx, handle, element)?;
        }
        Ok(Some(idx))
    }

    fn fill(&mut self, scene: &Scene, idx: usize, handle: Handle, element: &SceneElement) -> Result<()> {
        match element {
            SceneElement::Window(w) => {
                let (ty, p) = convert::window(w);
                self.set(idx, ty, p);
            }
            SceneElement::Renderer(r) => {
                let (ty, p) = convert::renderer(r);
                self.set(idx, ty, p);
            }
            SceneElement::Camera(c) => {
                let (ty, p) = convert::camera(c);
                self.set(idx, ty, p);
            }
            SceneElement::Light(l) => {
                let (ty, p) = convert::light(l);
                self.set(idx, ty, p);
            }
            SceneElement::Actor(a) => {
                let (ty, p) = convert::actor(a);
                self.set(idx, ty, p);
                let (pidx, created) = self.attach(idx, NodeKey::ActorProperty(handle), "setProperty", None);
                if created {
                    let (ty, p) = convert::surface_property(&a.property);
                    self.set(pidx, ty, p);
                }
                self.attach_actor_extras(scene, idx, a)?;
                if let Some(m) = a.mapper {
                    self.attach_element(scene, idx, m, "setMapper", None)?;
                }
            }
            SceneElement::Mapper(m) => {
                let (ty, p) = convert::mapper(m);
                self.set(idx, ty, p);
                if let Some(lut) = m.lookup_table {
                    self.attach_element(scene, idx, lut, "setLookupTable", None)?;
                }
                if let Some(input) = m.input {
                    self.attach_element(scene, idx, input, "setInputData", None)?;
                }
                if let MapperKind::Glyph(g) = &m.kind {
                    if let Some(source) = g.source {
                        self.attach_element(scene, idx, source, "setInputData", Some(1))?;
                    }
                }
            }
            SceneElement::Texture(t) => {
                let (ty, p) = convert::texture(t);
                self.set(idx, ty, p);
                if let Some(image) = t.image {
                    self.attach_element(scene, idx, image, "setInputData", None)?;
                }
            }
            SceneElement::Transform(t) => {
                let (ty, p) = convert::transform(t);
                self.set(idx, ty, p);
            }
            SceneElement::LookupTable(l) => {
                let (ty, p) = convert::lookup_table(l);
                self.set(idx, ty, p);
            }
            SceneElement::Data(d) => self.fill_data(idx, d),
        }
        Ok(())
    }

    fn attach_actor_extras(&mut self, scene: &Scene, idx: usize, actor: &Actor) -> Result<()> {
        if let Some(t) = actor.texture {
            self.attach_element(scene, idx, t, "addTexture", None)?;
        }
        if let Some(t) = actor.user_transform {
            self.attach_element(scene, idx, t, "setUserTransform", None)?;
        }
        Ok(())
    }

    /// One actor, mapper and dataset per non-empty leaf of the composite
    /// input, attached to the actor's parent.
    fn flatten_composite(
        &mut self,
        scene: &Scene,
        parent: usize,
        actor: &Actor,
        mapper_h: Handle,
        mapper: &Mapper,
        cda: &CompositeDisplayAttributes,
    ) -> Result<()> {
        let Some(input) = mapper.input.and_then(|h| scene.data(h)) else {
            debug!("composite mapper {mapper_h} has no input");
            return Ok(());
        };
        let leaves = match input {
            DataObject::MultiBlock(mb) => mb.leaves(),
            leaf => vec![(0, leaf)],
        };

        for (block, leaf) in leaves {
            if leaf.is_empty() {
                continue;
            }
            let key = |part| NodeKey::Fabricated {
                mapper: mapper_h,
                block,
                part,
            };
            let display = cda.block(block);

            let (aidx, created) = self.attach(parent, key(LeafPart::Actor), "addViewProp", None);
            if !created {
                continue;
            }
            let (ty, mut p) = convert::actor(actor);
            if let Some(v) = display.and_then(|d| d.visibility) {
                p.insert("visibility".into(), json!(v));
            }
            self.set(aidx, ty, p);

            let mut surface = actor.property.clone();
            if let Some(c) = display.and_then(|d| d.color) {
                surface.set_color(c);
            }
            if let Some(o) = display.and_then(|d| d.opacity) {
                surface.opacity = o;
            }
            let (pidx, _) = self.attach(aidx, key(LeafPart::Property), "setProperty", None);
            let (ty, p) = convert::surface_property(&surface);
            self.set(pidx, ty, p);

            self.attach_actor_extras(scene, aidx, actor)?;

            let (midx, _) = self.attach(aidx, key(LeafPart::Mapper), "setMapper", None);
            let (_, p) = convert::mapper(mapper);
            self.set(midx, "vtkOpenGLPolyDataMapper", p);
            if let Some(lut) = mapper.lookup_table {
                self.attach_element(scene, midx, lut, "setLookupTable", None)?;
            }

            let (didx, _) = self.attach(midx, key(LeafPart::Data), "setInputData", None);
            self.fill_data(didx, leaf);
        }
        Ok(())
    }

    fn fill_data(&mut self, idx: usize, data: &DataObject) {
        let mut p = Properties::new();
        match data {
            DataObject::PolyData(pd) => {
                if let Some(points) = pd.points() {
                    if let Some(r) = self.array_ref(points, "vtkPoints", Some("points")) {
                        p.insert("points".into(), r);
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
                    if let Some(r) = self.array_ref(&cells.legacy_array(key), "vtkCellArray", Some(key)) {
                        p.insert(key.into(), r);
                    }
                }
                let mut fields = self.fields(&pd.point_data, "pointData");
                fields.extend(self.fields(&pd.cell_data, "cellData"));
                p.insert("fields".into(), Value::Array(fields));
            }
            DataObject::ImageData(img) => {
                p.insert("spacing".into(), json!(img.spacing));
                p.insert("origin".into(), json!(img.origin));
                p.insert("extent".into(), json!(img.extent()));
                let mut fields = self.fields(&img.point_data, "pointData");
                fields.extend(self.fields(&img.cell_data, "cellData"));
                p.insert("fields".into(), Value::Array(fields));
            }
            DataObject::MultiBlock(_) => {}
        }
        self.set(idx, data.class_name(), p);
        let id = self.nodes[idx].id.clone();
        self.data_objects.push((id, data.clone()));
    }

    fn fields(&mut self, attrs: &DataSetAttributes, location: &str) -> Vec<Value> {
        let mut out = Vec::new();
        for (i, array) in attrs.arrays().iter().enumerate() {
            let Some(Value::Object(mut r)) = self.array_ref(array, "vtkDataArray", None) else {
                continue;
            };
            let registration = attrs.role_of(i).map_or("addArray", |role| role.registration());
            r.insert("location".into(), json!(location));
            r.insert("registration".into(), json!(registration));
            out.push(Value::Object(r));
        }
        out
    }

    /// Reference to a content-addressed array, recording it for publication.
    fn array_ref(&mut self, array: &DataArray, class_name: &str, name: Option<&str>) -> Option<Value> {
        let Some(blob) = encode_blob(array) else {
            debug!("bit array {:?} has no blob form", array.name());
            return None;
        };
        if self.known_arrays.insert(blob.id.clone()) {
            self.arrays.push((blob.id.clone(), array.clone()));
        }

        let mut ranges: Vec<Value> = (0..array.components())
            .map(|c| {
                let [min, max] = array.range(Some(c));
                json!({ "min": min, "max": max, "component": c })
            })
            .collect();
        if array.components() > 1 {
            let [min, max] = array.range(None);
            ranges.push(json!({ "min": min, "max": max, "component": Value::Null }));
        }

        let mut r = Map::new();
        r.insert("hash".into(), json!(blob.id));
        r.insert("vtkClass".into(), json!(class_name));
        r.insert("name".into(), json!(name.or(array.name()).unwrap_or("")));
        r.insert("dataType".into(), json!(blob.kind.js_array_name()));
        r.insert("numberOfComponents".into(), json!(array.components()));
        r.insert("size".into(), json!(blob.size));
        r.insert("ranges".into(), Value::Array(ranges));
        Some(Value::Object(r))
    }
}

fn composite_mapper<'s>(
    scene: &'s Scene,
    actor: &Actor,
) -> Option<(Handle, &'s Mapper, &'s CompositeDisplayAttributes)> {
    let h = actor.mapper?;
    let mapper = scene.mapper(h)?;
    match &mapper.kind {
        MapperKind::Composite(cda) => Some((h, mapper, cda)),
        _ => None,
    }
}

fn glyph_has_composite(scene: &Scene, mapper: &Mapper) -> bool {
    let MapperKind::Glyph(g) = &mapper.kind else {
        return false;
    };
    [mapper.input, g.source]
        .into_iter()
        .flatten()
        .any(|h| scene.data(h).is_some_and(DataObject::is_composite))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sources, MultiBlock};
    use crate::scene::{Camera, GlyphSettings, Light, RenderWindow, Renderer, Texture};

    struct Fixture {
        scene: Scene,
        window: Handle,
        renderer: Handle,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let window = scene.add_window(RenderWindow::default());
        let camera = scene.add_camera(Camera::default());
        let light = scene.add_light(Light::default());
        let renderer = scene.add_renderer(Renderer {
            active_camera: Some(camera),
            lights: vec![light],
            ..Default::default()
        });
        scene.render_window_mut(window).unwrap().renderers.push(renderer);
        Fixture { scene, window, renderer }
    }

    fn add_actor(scene: &mut Scene, renderer: Handle, mapper: Mapper) -> Handle {
        let mapper = scene.add_mapper(mapper);
        let actor = scene.add_actor(Actor {
            mapper: Some(mapper),
            ..Default::default()
        });
        scene.renderer_mut(renderer).unwrap().props.push(actor);
        actor
    }

    fn calls(node: &Value) -> Vec<(String, String)> {
        node["calls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| (c[0].as_str().unwrap().to_string(), c[1][0].as_str().unwrap().to_string()))
            .collect()
    }

    fn find<'v>(node: &'v Value, ty: &str, out: &mut Vec<&'v Value>) {
        if node["type"] == ty {
            out.push(node);
        }
        for d in node["dependencies"].as_array().unwrap() {
            find(d, ty, out);
        }
    }

    #[test]
    fn test_instance_ref_format() {
        assert_eq!(instance_ref("12"), "instance:${12}");
    }

    #[test]
    fn test_window_renderer_camera_light() -> Result<()> {
        let Fixture { scene, .. } = fixture();
        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;

        assert_eq!(doc["type"], "vtkOpenGLRenderWindow");
        assert!(doc["parent"].is_null());
        let ren = &doc["dependencies"][0];
        assert_eq!(ren["type"], "vtkOpenGLRenderer");
        assert_eq!(ren["parent"], doc["id"]);

        let names: Vec<_> = calls(ren).into_iter().map(|(m, _)| m).collect();
        assert_eq!(names, ["setActiveCamera", "addLight"]);
        assert_eq!(calls(&doc)[0], ("addRenderer".to_string(), instance_ref(ren["id"].as_str().unwrap())));
        Ok(())
    }

    #[test]
    fn test_shared_texture_defined_once() -> Result<()> {
        let Fixture { mut scene, renderer, .. } = fixture();
        let image = scene.add_data(sources::checkerboard(8, 8, 2).into());
        let texture = scene.add_texture(Texture {
            image: Some(image),
            ..Default::default()
        });
        for _ in 0..2 {
            let data = scene.add_data(sources::plane(1.0, 1, 1).into());
            let actor = add_actor(
                &mut scene,
                renderer,
                Mapper {
                    input: Some(data),
                    ..Default::default()
                },
            );
            scene.actor_mut(actor).unwrap().texture = Some(texture);
        }

        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;
        let tex_id = ser.id_of(NodeKey::Element(texture)).unwrap().to_string();

        let mut textures = Vec::new();
        find(&doc, "vtkOpenGLTexture", &mut textures);
        assert_eq!(textures.len(), 1);

        let mut actors = Vec::new();
        find(&doc, "vtkOpenGLActor", &mut actors);
        assert_eq!(actors.len(), 2);
        for actor in actors {
            assert!(calls(actor).contains(&("addTexture".to_string(), instance_ref(&tex_id))));
        }
        Ok(())
    }

    #[test]
    fn test_mapper_dataset_fields() -> Result<()> {
        let Fixture { mut scene, renderer, .. } = fixture();
        let data = scene.add_data(sources::sphere(1.0, 8, 8).into());
        add_actor(
            &mut scene,
            renderer,
            Mapper {
                input: Some(data),
                ..Default::default()
            },
        );

        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;
        let mut polys = Vec::new();
        find(&doc, "vtkPolyData", &mut polys);
        assert_eq!(polys.len(), 1);

        let props = &polys[0]["properties"];
        assert_eq!(props["points"]["vtkClass"], "vtkPoints");
        assert!(props["polys"]["hash"].as_str().unwrap().starts_with("Int32_"));
        let fields = props["fields"].as_array().unwrap();
        let elevation = fields.iter().find(|f| f["name"] == "Elevation").unwrap();
        assert_eq!(elevation["registration"], "setScalars");
        assert_eq!(elevation["location"], "pointData");
        assert_eq!(elevation["ranges"].as_array().unwrap().len(), 1);

        assert_eq!(ser.data_objects().len(), 1);
        assert_eq!(ser.data_objects()[0].0, polys[0]["id"].as_str().unwrap());
        assert!(ser.arrays().len() >= 3);
        Ok(())
    }

    #[test]
    fn test_composite_is_flattened() -> Result<()> {
        let Fixture { mut scene, renderer, .. } = fixture();
        let mut mb = MultiBlock::new();
        mb.push(Some(sources::plane(1.0, 1, 1).into()));
        mb.push(None);
        mb.push(Some(sources::plane(2.0, 2, 2).into()));
        let data = scene.add_data(mb.into());

        let mut cda = CompositeDisplayAttributes::default();
        cda.set_color(3, [1.0, 0.0, 0.0]);
        cda.set_visibility(1, false);
        let actor = add_actor(
            &mut scene,
            renderer,
            Mapper {
                kind: MapperKind::Composite(cda),
                input: Some(data),
                ..Default::default()
            },
        );

        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;
        assert!(ser.id_of(NodeKey::Element(actor)).is_none());

        let mut actors = Vec::new();
        find(&doc, "vtkOpenGLActor", &mut actors);
        assert_eq!(actors.len(), 2);
        assert_eq!(actors[0]["properties"]["visibility"], false);
        assert_eq!(actors[1]["properties"]["visibility"], true);
        let prop = &actors[1]["dependencies"][0];
        assert_eq!(prop["type"], "vtkOpenGLProperty");
        assert_eq!(prop["properties"]["diffuseColor"], json!([1.0, 0.0, 0.0]));

        let mut mappers = Vec::new();
        find(&doc, "vtkOpenGLPolyDataMapper", &mut mappers);
        assert_eq!(mappers.len(), 2);
        assert_eq!(ser.data_objects().len(), 2);
        Ok(())
    }

    #[test]
    fn test_glyph_with_composite_source_rejected() -> Result<()> {
        let Fixture { mut scene, renderer, .. } = fixture();
        let points = scene.add_data(sources::plane(1.0, 1, 1).into());
        let source = scene.add_data(MultiBlock::new().into());
        let actor = add_actor(
            &mut scene,
            renderer,
            Mapper {
                kind: MapperKind::Glyph(GlyphSettings {
                    source: Some(source),
                    ..Default::default()
                }),
                input: Some(points),
                ..Default::default()
            },
        );

        let mut ser = SceneGraphSerializer::new();
        ser.serialize_scene(&scene)?;
        assert!(ser.id_of(NodeKey::Element(actor)).is_some());
        let mapper = scene.actor(actor).unwrap().mapper.unwrap();
        assert!(ser.id_of(NodeKey::Element(mapper)).is_none());
        assert!(ser.data_objects().is_empty());
        Ok(())
    }

    #[test]
    fn test_glyph_source_on_port_one() -> Result<()> {
        let Fixture { mut scene, renderer, .. } = fixture();
        let points = scene.add_data(sources::plane(1.0, 1, 1).into());
        let source = scene.add_data(sources::sphere(0.1, 6, 6).into());
        let actor = add_actor(
            &mut scene,
            renderer,
            Mapper {
                kind: MapperKind::Glyph(GlyphSettings {
                    source: Some(source),
                    ..Default::default()
                }),
                input: Some(points),
                ..Default::default()
            },
        );

        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;
        let mapper_h = scene.actor(actor).unwrap().mapper.unwrap();
        let mapper_id = ser.id_of(NodeKey::Element(mapper_h)).unwrap().to_string();
        let mut glyphs = Vec::new();
        find(&doc, "vtkOpenGLGlyph3DMapper", &mut glyphs);
        assert_eq!(glyphs[0]["id"], mapper_id.as_str());
        let last = glyphs[0]["calls"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last[0], "setInputData");
        assert_eq!(last[1][1], 1);
        Ok(())
    }

    #[test]
    fn test_add_node_requires_serialized_parent() {
        let Fixture { scene, window, renderer } = fixture();
        let mut ser = SceneGraphSerializer::new();
        assert!(matches!(ser.add_node(&scene, window, renderer), Err(Error::NullInput(_))));
        assert!(ser.to_json().is_null());
    }

    fn hashes<'v>(node: &'v Value, out: &mut Vec<&'v str>) {
        match node {
            Value::Object(map) => {
                if let Some(Value::String(h)) = map.get("hash") {
                    out.push(h);
                }
                map.values().for_each(|v| hashes(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| hashes(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_publish_stores_every_referenced_array() -> Result<()> {
        use crate::archive::zip::read_entries;
        use crate::archive::PartitionedArchive;

        let Fixture { mut scene, renderer, .. } = fixture();
        let plane = scene.add_data(sources::plane(1.0, 2, 2).into());
        add_actor(&mut scene, renderer, Mapper { input: Some(plane), ..Default::default() });
        let mut ser = SceneGraphSerializer::new();
        let doc = ser.serialize_scene(&scene)?;

        let mut sink = PartitionedArchive::new();
        assert_eq!(ser.publish(&mut sink)?, ser.arrays().len());

        let mut refs = Vec::new();
        hashes(&doc, &mut refs);
        assert_eq!(refs.len(), 3);
        for id in refs {
            let path = format!("data/{id}");
            let (_, array) = ser.arrays().iter().find(|(a, _)| a == id).unwrap();
            let entries = read_entries(sink.buffer(&path).unwrap())?;
            assert_eq!(entries[0].data, array.to_le_bytes().unwrap());
        }
        let index = read_entries(sink.buffer("index.json").unwrap())?;
        let stored: Value = serde_json::from_slice(&index[0].data)?;
        assert_eq!(stored, doc);

        // Blobs already present are not stored again.
        assert_eq!(ser.publish(&mut sink)?, 0);
        Ok(())
    }

    #[test]
    fn test_publish_before_serialize_fails() {
        let ser = SceneGraphSerializer::new();
        let mut sink = crate::archive::PartitionedArchive::new();
        assert!(matches!(ser.publish(&mut sink), Err(Error::NullInput(_))));
    }

    #[test]
    fn test_repeat_add_reuses_id() -> Result<()> {
        let Fixture { scene, window, renderer } = fixture();
        let mut ser = SceneGraphSerializer::new();
        ser.serialize_window(&scene, window)?;
        let a = ser.add_node(&scene, window, renderer)?;
        let b = ser.add_node(&scene, window, renderer)?;
        assert_eq!(a, b);
        let doc = ser.to_json();
        assert_eq!(doc["dependencies"].as_array().unwrap().len(), 1);
        assert_eq!(doc["calls"].as_array().unwrap().len(), 2);
        Ok(())
    }
}
