pub mod cover_image;
pub mod docs;
pub mod health;
pub mod jobs;
