pub mod image_payload;
pub mod job_fields;
pub mod time;
pub mod validation;
