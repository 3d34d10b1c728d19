pub mod generated_image;
pub mod image_model;
pub mod job_posting;
