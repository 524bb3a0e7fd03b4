//! Scene element types.

use std::collections::HashMap;

use super::Handle;

/// Explicit kind tag of a [`SceneElement`](super::SceneElement).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Window,
    Renderer,
    Camera,
    Light,
    Actor,
    Mapper,
    Texture,
    Transform,
    LookupTable,
    Data,
}

/// Top-level render window.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderWindow {
    pub size: [u32; 2],
    pub number_of_layers: u32,
    pub renderers: Vec<Handle>,
}

impl Default for RenderWindow {
    fn default() -> Self {
        Self {
            size: [300, 300],
            number_of_layers: 1,
            renderers: Vec::new(),
        }
    }
}

/// Viewport owning a camera, lights and props.
#[derive(Clone, Debug, PartialEq)]
pub struct Renderer {
    pub background: [f64; 3],
    pub active_camera: Option<Handle>,
    pub lights: Vec<Handle>,
    pub props: Vec<Handle>,
    pub layer: u32,
    pub viewport: [f64; 4],
    pub two_sided_lighting: bool,
    pub interactive: bool,
    pub center_of_rotation: Option<[f64; 3]>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            background: [0.32, 0.34, 0.43],
            active_camera: None,
            lights: Vec::new(),
            props: Vec::new(),
            layer: 0,
            viewport: [0.0, 0.0, 1.0, 1.0],
            two_sided_lighting: true,
            interactive: true,
            center_of_rotation: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: [f64; 3],
    pub focal_point: [f64; 3],
    pub view_up: [f64; 3],
    pub view_angle: f64,
    pub clipping_range: [f64; 2],
    pub parallel_projection: bool,
    pub parallel_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.0],
            focal_point: [0.0; 3],
            view_up: [0.0, 1.0, 0.0],
            view_angle: 30.0,
            clipping_range: [0.01, 1000.01],
            parallel_projection: false,
            parallel_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightType {
    #[default]
    Headlight,
    CameraLight,
    SceneLight,
}

impl LightType {
    /// Numeric code used by the web viewer.
    pub const fn code(self) -> u8 {
        match self {
            Self::Headlight => 1,
            Self::CameraLight => 2,
            Self::SceneLight => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub position: [f64; 3],
    pub focal_point: [f64; 3],
    pub color: [f64; 3],
    pub intensity: f64,
    pub switch: bool,
    pub positional: bool,
    pub cone_angle: f64,
    pub exponent: f64,
    pub attenuation: [f64; 3],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::default(),
            position: [0.0, 0.0, 1.0],
            focal_point: [0.0; 3],
            color: [1.0; 3],
            intensity: 1.0,
            switch: true,
            positional: false,
            cone_angle: 30.0,
            exponent: 1.0,
            attenuation: [1.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Representation {
    Points = 0,
    Wireframe = 1,
    #[default]
    Surface = 2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Flat = 0,
    #[default]
    Gouraud = 1,
    Phong = 2,
}

/// Surface appearance of an actor.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceProperty {
    pub representation: Representation,
    pub interpolation: Interpolation,
    pub color: [f64; 3],
    pub ambient_color: [f64; 3],
    pub diffuse_color: [f64; 3],
    pub specular_color: [f64; 3],
    pub edge_color: [f64; 3],
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub specular_power: f64,
    pub opacity: f64,
    pub edge_visibility: bool,
    pub backface_culling: bool,
    pub frontface_culling: bool,
    pub point_size: f64,
    pub line_width: f64,
    pub lighting: bool,
}

impl Default for SurfaceProperty {
    fn default() -> Self {
        Self {
            representation: Representation::default(),
            interpolation: Interpolation::default(),
            color: [1.0; 3],
            ambient_color: [1.0; 3],
            diffuse_color: [1.0; 3],
            specular_color: [1.0; 3],
            edge_color: [0.0; 3],
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
            specular_power: 1.0,
            opacity: 1.0,
            edge_visibility: false,
            backface_culling: false,
            frontface_culling: false,
            point_size: 5.0,
            line_width: 1.0,
            lighting: true,
        }
    }
}

impl SurfaceProperty {
    /// Set both the base and diffuse color.
    pub fn set_color(&mut self, color: [f64; 3]) {
        self.color = color;
        self.diffuse_color = color;
    }
}

/// Drawable prop.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub mapper: Option<Handle>,
    pub texture: Option<Handle>,
    pub user_transform: Option<Handle>,
    pub property: SurfaceProperty,
    pub origin: [f64; 3],
    pub position: [f64; 3],
    pub scale: [f64; 3],
    /// Rotation in degrees about x, y, z (applied in z, x, y order).
    pub orientation: [f64; 3],
    pub visibility: bool,
    pub pickable: bool,
    pub dragable: bool,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            mapper: None,
            texture: None,
            user_transform: None,
            property: SurfaceProperty::default(),
            origin: [0.0; 3],
            position: [0.0; 3],
            scale: [1.0; 3],
            orientation: [0.0; 3],
            visibility: true,
            pickable: true,
            dragable: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Default = 0,
    MapScalars = 1,
    DirectScalars = 2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalarMode {
    #[default]
    Default = 0,
    UsePointData = 1,
    UseCellData = 2,
    UsePointFieldData = 3,
    UseCellFieldData = 4,
    UseFieldData = 5,
}

/// Per-block overrides of a composite mapper, keyed by flat block index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockDisplay {
    pub color: Option<[f64; 3]>,
    pub opacity: Option<f64>,
    pub visibility: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeDisplayAttributes {
    blocks: HashMap<usize, BlockDisplay>,
}

impl CompositeDisplayAttributes {
    pub fn block(&self, flat_index: usize) -> Option<&BlockDisplay> {
        self.blocks.get(&flat_index)
    }

    pub fn block_mut(&mut self, flat_index: usize) -> &mut BlockDisplay {
        self.blocks.entry(flat_index).or_default()
    }

    pub fn set_color(&mut self, flat_index: usize, color: [f64; 3]) {
        self.block_mut(flat_index).color = Some(color);
    }

    pub fn set_opacity(&mut self, flat_index: usize, opacity: f64) {
        self.block_mut(flat_index).opacity = Some(opacity);
    }

    pub fn set_visibility(&mut self, flat_index: usize, visible: bool) {
        self.block_mut(flat_index).visibility = Some(visible);
    }
}

/// Glyph placement settings.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphSettings {
    pub source: Option<Handle>,
    pub scaling: bool,
    pub scale_factor: f64,
    pub scale_array: Option<String>,
    pub orient: bool,
    pub orientation_array: Option<String>,
}

impl Default for GlyphSettings {
    fn default() -> Self {
        Self {
            source: None,
            scaling: true,
            scale_factor: 1.0,
            scale_array: None,
            orient: true,
            orientation_array: None,
        }
    }
}

/// Mapper flavours; each is serialized differently.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MapperKind {
    #[default]
    Surface,
    Composite(CompositeDisplayAttributes),
    Glyph(GlyphSettings),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mapper {
    pub kind: MapperKind,
    pub input: Option<Handle>,
    pub lookup_table: Option<Handle>,
    pub color_mode: ColorMode,
    pub scalar_mode: ScalarMode,
    pub color_by_array_name: Option<String>,
    pub color_by_component: Option<usize>,
    pub scalar_range: [f64; 2],
    pub scalar_visibility: bool,
    pub interpolate_scalars_before_mapping: bool,
    pub use_lookup_table_scalar_range: bool,
}

impl Default for Mapper {
    fn default() -> Self {
        Self {
            kind: MapperKind::default(),
            input: None,
            lookup_table: None,
            color_mode: ColorMode::default(),
            scalar_mode: ScalarMode::default(),
            color_by_array_name: None,
            color_by_component: None,
            scalar_range: [0.0, 1.0],
            scalar_visibility: true,
            interpolate_scalars_before_mapping: false,
            use_lookup_table_scalar_range: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub image: Option<Handle>,
    pub interpolate: bool,
    pub repeat: bool,
    pub edge_clamp: bool,
    pub mipmap: bool,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            image: None,
            interpolate: true,
            repeat: true,
            edge_clamp: false,
            mipmap: false,
        }
    }
}

/// 4×4 row-major matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub matrix: [f64; 16],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }
}

/// Scalar-to-color table built by HSV interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupTable {
    pub number_of_colors: usize,
    pub range: [f64; 2],
    pub hue_range: [f64; 2],
    pub saturation_range: [f64; 2],
    pub value_range: [f64; 2],
    pub alpha_range: [f64; 2],
    pub nan_color: [f64; 4],
    pub below_range_color: [f64; 4],
    pub above_range_color: [f64; 4],
    pub use_below_range_color: bool,
    pub use_above_range_color: bool,
}

impl Default for LookupTable {
    fn default() -> Self {
        Self {
            number_of_colors: 256,
            range: [0.0, 1.0],
            hue_range: [0.0, 0.66667],
            saturation_range: [1.0, 1.0],
            value_range: [1.0, 1.0],
            alpha_range: [1.0, 1.0],
            nan_color: [0.5, 0.0, 0.0, 1.0],
            below_range_color: [0.0, 0.0, 0.0, 1.0],
            above_range_color: [1.0, 1.0, 1.0, 1.0],
            use_below_range_color: false,
            use_above_range_color: false,
        }
    }
}

impl LookupTable {
    /// RGBA entries, linearly ramped in HSV space.
    pub fn build(&self) -> Vec<[u8; 4]> {
        let n = self.number_of_colors.max(1);
        let step = |r: [f64; 2], i: usize| {
            if n == 1 {
                r[0]
            } else {
                r[0] + (r[1] - r[0]) * i as f64 / (n - 1) as f64
            }
        };
        (0..n)
            .map(|i| {
                let [r, g, b] = hsv_to_rgb(
                    step(self.hue_range, i),
                    step(self.saturation_range, i),
                    step(self.value_range, i),
                );
                let a = step(self.alpha_range, i);
                [to_u8(r), to_u8(g), to_u8(b), to_u8(a)]
            })
            .collect()
    }
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// HSV (all in `[0, 1]`) to RGB.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h = h.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lut_runs_red_to_blue() {
        let table = LookupTable::default().build();
        assert_eq!(table.len(), 256);
        assert_eq!(table[0], [255, 0, 0, 255]);
        let last = table[255];
        assert_eq!(last[2], 255);
        assert!(last[0] < 5);
    }

    #[test]
    fn test_single_color_lut() {
        let lut = LookupTable {
            number_of_colors: 1,
            hue_range: [0.33333, 0.9],
            ..Default::default()
        };
        let table = lut.build();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0][1], 255);
    }

    #[test]
    fn test_composite_overrides() {
        let mut cda = CompositeDisplayAttributes::default();
        cda.set_color(3, [1.0, 0.0, 0.0]);
        cda.set_opacity(3, 0.5);
        assert_eq!(cda.block(3).unwrap().opacity, Some(0.5));
        assert!(cda.block(1).is_none());
    }
}
