pub mod application;
pub mod company;
pub mod hr_request;
pub mod job;
pub mod notification;
pub mod student_score;
pub mod user;
