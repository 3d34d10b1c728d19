pub mod blob_store;
pub mod cover_image_service;
pub mod gemini_service;
pub mod grok_service;
pub mod image_generator;
pub mod job_import_service;
pub mod job_posting_service;
pub mod newsletter_service;
pub mod serpapi_service;
