pub mod cover_image_dto;
pub mod job_dto;
pub mod serpapi_dto;
