pub mod attempt_dto;
pub mod session_dto;
