pub mod blob;
pub mod generation;
pub mod provider;
pub mod s3;
pub mod versions;
pub mod worker;
