pub mod application_service;
pub mod interview_service;
pub mod matching_service;
pub mod round_service;
pub mod sweep_service;
