pub mod application_dto;
pub mod company_dto;
pub mod hr_request_dto;
pub mod job_dto;
pub mod notification_dto;
pub mod response;
