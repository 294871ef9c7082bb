pub mod token_dto;
pub mod user_dto;
