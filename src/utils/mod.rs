pub mod image_probe;
pub mod scene_document;
