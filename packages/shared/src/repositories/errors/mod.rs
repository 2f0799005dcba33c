pub mod match_repository_errors;
pub mod participant_repository_errors;
