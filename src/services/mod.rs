pub mod blobs;
pub mod erasure;
pub mod meetings;
pub mod records;
pub mod upload;
