pub mod errors;
pub mod match_repository;
pub mod participant_repository;
