//! Arena of exportable scene elements.
//!
//! Every element lives in one [`Scene`] and is referenced by a [`Handle`].
//! Identity maps used during export key off handles, so two props sharing a
//! texture share one handle and serialize to one node.

mod elements;

pub use elements::{
    Actor, BlockDisplay, Camera, ColorMode, CompositeDisplayAttributes, ElementKind,
    GlyphSettings, Interpolation, Light, LightType, LookupTable, Mapper, MapperKind,
    RenderWindow, Renderer, Representation, ScalarMode, SurfaceProperty, Texture, Transform,
};

use std::fmt;

use crate::dataset::DataObject;

/// Stable index of an element in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl Handle {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One exportable object.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneElement {
    Window(RenderWindow),
    Renderer(Renderer),
    Camera(Camera),
    Light(Light),
    Actor(Actor),
    Mapper(Mapper),
    Texture(Texture),
    Transform(Transform),
    LookupTable(LookupTable),
    Data(DataObject),
}

impl SceneElement {
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Window(_) => ElementKind::Window,
            Self::Renderer(_) => ElementKind::Renderer,
            Self::Camera(_) => ElementKind::Camera,
            Self::Light(_) => ElementKind::Light,
            Self::Actor(_) => ElementKind::Actor,
            Self::Mapper(_) => ElementKind::Mapper,
            Self::Texture(_) => ElementKind::Texture,
            Self::Transform(_) => ElementKind::Transform,
            Self::LookupTable(_) => ElementKind::LookupTable,
            Self::Data(_) => ElementKind::Data,
        }
    }
}

macro_rules! accessors {
    ($($variant:ident, $ty:ty, $add:ident, $get:ident, $get_mut:ident;)*) => {
        $(
            pub fn $add(&mut self, value: $ty) -> Handle {
                self.push(SceneElement::$variant(value))
            }

            pub fn $get(&self, h: Handle) -> Option<&$ty> {
                match self.elements.get(h.index())? {
                    SceneElement::$variant(v) => Some(v),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self, h: Handle) -> Option<&mut $ty> {
                match self.elements.get_mut(h.index())? {
                    SceneElement::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

/// Owner of all scene elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    elements: Vec<SceneElement>,
    window: Option<Handle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: SceneElement) -> Handle {
        let h = Handle(self.elements.len() as u32);
        if self.window.is_none() && matches!(element, SceneElement::Window(_)) {
            self.window = Some(h);
        }
        self.elements.push(element);
        h
    }

    pub fn get(&self, h: Handle) -> Option<&SceneElement> {
        self.elements.get(h.index())
    }

    pub fn kind(&self, h: Handle) -> Option<ElementKind> {
        self.get(h).map(SceneElement::kind)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The first window added.
    pub fn window(&self) -> Option<Handle> {
        self.window
    }

    accessors! {
        Window, RenderWindow, add_window, render_window, render_window_mut;
        Renderer, Renderer, add_renderer, renderer, renderer_mut;
        Camera, Camera, add_camera, camera, camera_mut;
        Light, Light, add_light, light, light_mut;
        Actor, Actor, add_actor, actor, actor_mut;
        Mapper, Mapper, add_mapper, mapper, mapper_mut;
        Texture, Texture, add_texture, texture, texture_mut;
        Transform, Transform, add_transform, transform, transform_mut;
        LookupTable, LookupTable, add_lookup_table, lookup_table, lookup_table_mut;
        Data, DataObject, add_data, data, data_mut;
    }

    /// Renderers of the main window, in order.
    pub fn renderers(&self) -> Vec<Handle> {
        self.window
            .and_then(|w| self.render_window(w))
            .map(|w| w.renderers.clone())
            .unwrap_or_default()
    }

    /// Resolve an actor's input dataset through its mapper.
    pub fn actor_input(&self, actor: Handle) -> Option<(Handle, &DataObject)> {
        let mapper = self.mapper(self.actor(actor)?.mapper?)?;
        let input = mapper.input?;
        Some((input, self.data(input)?))
    }

    /// Image behind a texture.
    pub fn texture_image(&self, texture: Handle) -> Option<&DataObject> {
        self.data(self.texture(texture)?.image?)
    }
}
