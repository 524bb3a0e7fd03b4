//! Scene graph document: identifier stability and reference integrity.

use std::collections::HashSet;

use serde_json::Value;

use scenepack::dataset::sources;
use scenepack::prelude::*;
use scenepack::serializer::{instance_ref, NodeKey};

fn collect<'v>(node: &'v Value, out: &mut Vec<&'v Value>) {
    out.push(node);
    for dep in node["dependencies"].as_array().unwrap() {
        collect(dep, out);
    }
}

fn shared_texture_scene() -> (Scene, Handle) {
    let mut scene = Scene::new();
    let window = scene.add_window(RenderWindow::default());
    let renderer = scene.add_renderer(Renderer::default());
    scene.render_window_mut(window).unwrap().renderers.push(renderer);

    let image = scene.add_data(sources::checkerboard(16, 16, 4).into());
    let texture = scene.add_texture(Texture {
        image: Some(image),
        ..Default::default()
    });
    for size in [1.0, 2.0] {
        let data = scene.add_data(sources::plane(size, 2, 2).into());
        let mapper = scene.add_mapper(Mapper {
            input: Some(data),
            ..Default::default()
        });
        let actor = scene.add_actor(Actor {
            mapper: Some(mapper),
            texture: Some(texture),
            ..Default::default()
        });
        scene.renderer_mut(renderer).unwrap().props.push(actor);
    }
    (scene, texture)
}

#[test]
fn test_shared_texture_one_id_two_calls() -> Result<()> {
    let (scene, texture) = shared_texture_scene();
    let mut serializer = SceneGraphSerializer::new();
    let doc = serializer.serialize_scene(&scene)?;

    let mut nodes = Vec::new();
    collect(&doc, &mut nodes);
    let tex_id = serializer.id_of(NodeKey::Element(texture)).unwrap();

    let definitions = nodes.iter().filter(|n| n["id"] == tex_id).count();
    assert_eq!(definitions, 1);

    let reference = instance_ref(tex_id);
    let calls = nodes
        .iter()
        .flat_map(|n| n["calls"].as_array().unwrap())
        .filter(|c| c[0] == "addTexture" && c[1][0] == reference.as_str())
        .count();
    assert_eq!(calls, 2);
    Ok(())
}

#[test]
fn test_ids_unique_and_calls_resolve() -> Result<()> {
    let (scene, _) = shared_texture_scene();
    let mut serializer = SceneGraphSerializer::new();
    let doc = serializer.serialize_scene(&scene)?;

    let mut nodes = Vec::new();
    collect(&doc, &mut nodes);
    let ids: HashSet<&str> = nodes.iter().map(|n| n["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), nodes.len());
    assert_eq!(ids.len(), serializer.num_nodes());

    for node in &nodes {
        for call in node["calls"].as_array().unwrap() {
            let arg = call[1][0].as_str().unwrap();
            let id = arg.strip_prefix("instance:${").and_then(|s| s.strip_suffix('}')).unwrap();
            assert!(ids.contains(id), "dangling reference {arg}");
        }
    }
    Ok(())
}

#[test]
fn test_separate_serializers_are_independent() -> Result<()> {
    let (scene, texture) = shared_texture_scene();
    let mut a = SceneGraphSerializer::new();
    let mut b = SceneGraphSerializer::new();
    a.serialize_scene(&scene)?;
    b.serialize_scene(&scene)?;
    assert_eq!(a.id_of(NodeKey::Element(texture)), b.id_of(NodeKey::Element(texture)));
    assert_eq!(a.to_json(), b.to_json());
    Ok(())
}

#[test]
fn test_arrays_deduplicated_across_datasets() -> Result<()> {
    let (scene, _) = shared_texture_scene();
    let mut serializer = SceneGraphSerializer::new();
    serializer.serialize_scene(&scene)?;

    // Both planes share the 2x2 connectivity and texture coordinates.
    assert_eq!(serializer.data_objects().len(), 3);
    let ids: HashSet<&str> = serializer.arrays().iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids.len(), serializer.arrays().len());
    Ok(())
}

fn hash_refs<'v>(node: &'v Value, out: &mut Vec<&'v str>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(h)) = map.get("hash") {
                out.push(h);
            }
            map.values().for_each(|v| hash_refs(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| hash_refs(v, out)),
        _ => {}
    }
}

#[test]
fn test_published_hashes_resolve_to_blobs() -> Result<()> {
    let (scene, _) = shared_texture_scene();
    let mut serializer = SceneGraphSerializer::new();
    let doc = serializer.serialize_scene(&scene)?;

    let dir = tempfile::tempdir()?;
    let mut sink = DirectoryArchive::new(dir.path());
    let stored = serializer.publish(&mut sink)?;
    assert_eq!(stored, serializer.arrays().len());

    let mut refs = Vec::new();
    hash_refs(&doc, &mut refs);
    assert!(!refs.is_empty());
    for id in refs {
        let (_, array) = serializer.arrays().iter().find(|(a, _)| a == id).unwrap();
        let bytes = std::fs::read(dir.path().join("data").join(id))?;
        assert_eq!(bytes, array.to_le_bytes().unwrap());
    }

    let index: Value = serde_json::from_slice(&std::fs::read(dir.path().join("index.json"))?)?;
    assert_eq!(index, doc);
    Ok(())
}
