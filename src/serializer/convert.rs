//! Per-kind property converters.
//!
//! Each function turns one element into the `(type, properties)` pair of its
//! scene node. Dependencies and calls are wired by the serializer.

use serde_json::{json, Map, Value};

use crate::scene::{
    Actor, Camera, Light, LookupTable, Mapper, MapperKind, RenderWindow, Renderer,
    SurfaceProperty, Texture, Transform,
};

pub(crate) type Properties = Map<String, Value>;

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

pub(crate) fn window(w: &RenderWindow) -> (&'static str, Properties) {
    (
        "vtkOpenGLRenderWindow",
        props(json!({
            "numberOfLayers": w.number_of_layers,
            "size": w.size,
        })),
    )
}

pub(crate) fn renderer(r: &Renderer) -> (&'static str, Properties) {
    let mut p = props(json!({
        "background": r.background,
        "layer": r.layer,
        "viewport": r.viewport,
        "twoSidedLighting": r.two_sided_lighting,
        "interactive": r.interactive,
    }));
    if let Some(c) = r.center_of_rotation {
        p.insert("centerOfRotation".into(), json!(c));
    }
    ("vtkOpenGLRenderer", p)
}

pub(crate) fn camera(c: &Camera) -> (&'static str, Properties) {
    (
        "vtkOpenGLCamera",
        props(json!({
            "position": c.position,
            "focalPoint": c.focal_point,
            "viewUp": c.view_up,
            "viewAngle": c.view_angle,
            "clippingRange": c.clipping_range,
            "parallelProjection": c.parallel_projection,
            "parallelScale": c.parallel_scale,
        })),
    )
}

pub(crate) fn light(l: &Light) -> (&'static str, Properties) {
    (
        "vtkOpenGLLight",
        props(json!({
            "lightType": l.light_type.code(),
            "position": l.position,
            "focalPoint": l.focal_point,
            "color": l.color,
            "intensity": l.intensity,
            "switch": l.switch,
            "positional": l.positional,
            "coneAngle": l.cone_angle,
            "exponent": l.exponent,
            "attenuationValues": l.attenuation,
        })),
    )
}

pub(crate) fn actor(a: &Actor) -> (&'static str, Properties) {
    (
        "vtkOpenGLActor",
        props(json!({
            "origin": a.origin,
            "position": a.position,
            "scale": a.scale,
            "orientation": a.orientation,
            "visibility": a.visibility,
            "pickable": a.pickable,
            "dragable": a.dragable,
        })),
    )
}

pub(crate) fn surface_property(p: &SurfaceProperty) -> (&'static str, Properties) {
    (
        "vtkOpenGLProperty",
        props(json!({
            "representation": p.representation as u8,
            "interpolation": p.interpolation as u8,
            "color": p.color,
            "ambientColor": p.ambient_color,
            "diffuseColor": p.diffuse_color,
            "specularColor": p.specular_color,
            "edgeColor": p.edge_color,
            "ambient": p.ambient,
            "diffuse": p.diffuse,
            "specular": p.specular,
            "specularPower": p.specular_power,
            "opacity": p.opacity,
            "edgeVisibility": p.edge_visibility,
            "backfaceCulling": p.backface_culling,
            "frontfaceCulling": p.frontface_culling,
            "pointSize": p.point_size,
            "lineWidth": p.line_width,
            "lighting": p.lighting,
        })),
    )
}

/// Mapper node. Composite mappers that reach here unflattened keep their
/// own type name.
pub(crate) fn mapper(m: &Mapper) -> (&'static str, Properties) {
    let mut p = props(json!({
        "colorByArrayName": m.color_by_array_name.as_deref().unwrap_or(""),
        "arrayAccessMode": u8::from(m.color_by_array_name.is_some()),
        "colorMode": m.color_mode as u8,
        "scalarMode": m.scalar_mode as u8,
        "scalarRange": m.scalar_range,
        "scalarVisibility": m.scalar_visibility,
        "interpolateScalarsBeforeMapping": m.interpolate_scalars_before_mapping,
        "useLookupTableScalarRange": m.use_lookup_table_scalar_range,
    }));
    let type_name = match &m.kind {
        MapperKind::Surface => "vtkOpenGLPolyDataMapper",
        MapperKind::Composite(_) => "vtkCompositePolyDataMapper2",
        MapperKind::Glyph(g) => {
            p.insert("scaling".into(), json!(g.scaling));
            p.insert("scaleFactor".into(), json!(g.scale_factor));
            p.insert("scaleArray".into(), json!(g.scale_array));
            p.insert("orient".into(), json!(g.orient));
            p.insert("orientationArray".into(), json!(g.orientation_array));
            "vtkOpenGLGlyph3DMapper"
        }
    };
    if let Some(c) = m.color_by_component {
        p.insert("colorByArrayComponent".into(), json!(c));
    }
    (type_name, p)
}

pub(crate) fn texture(t: &Texture) -> (&'static str, Properties) {
    (
        "vtkOpenGLTexture",
        props(json!({
            "interpolate": t.interpolate,
            "repeat": t.repeat,
            "edgeClamp": t.edge_clamp,
            "mipmap": t.mipmap,
        })),
    )
}

pub(crate) fn transform(t: &Transform) -> (&'static str, Properties) {
    ("vtkTransform", props(json!({ "matrix": t.matrix })))
}

pub(crate) fn lookup_table(l: &LookupTable) -> (&'static str, Properties) {
    (
        "vtkLookupTable",
        props(json!({
            "numberOfColors": l.number_of_colors,
            "mappingRange": l.range,
            "hueRange": l.hue_range,
            "saturationRange": l.saturation_range,
            "valueRange": l.value_range,
            "alphaRange": l.alpha_range,
            "nanColor": l.nan_color,
            "belowRangeColor": l.below_range_color,
            "aboveRangeColor": l.above_range_color,
            "useBelowRangeColor": l.use_below_range_color,
            "useAboveRangeColor": l.use_above_range_color,
        })),
    )
}
