pub mod application_service;
pub mod company_service;
pub mod hr_request_service;
pub mod job_service;
pub mod notification_service;
pub mod qualification;
pub mod score_service;
