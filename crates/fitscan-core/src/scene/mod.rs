//! Scene document model and loader.

pub mod document;
pub mod loader;

pub use document::{
    AssetInfo, Image, Material, Mesh, Node, PbrProperties, Scene, SceneDocument, Texture,
    TextureChannel, TextureRef, Transform,
};
pub use loader::{inspect, load, LoadOutcome, UnsupportedDocument, UnsupportedReason};
