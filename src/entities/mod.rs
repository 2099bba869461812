pub mod candidate_image;
pub mod generation_job;
pub mod image_asset;
pub mod project;
pub mod version;
