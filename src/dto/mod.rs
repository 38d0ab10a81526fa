pub mod application_dto;
pub mod interview_dto;
pub mod round_dto;
