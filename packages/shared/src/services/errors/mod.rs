pub mod auth_service_errors;
pub mod match_session_service_errors;
pub mod matchmaking_service_errors;
pub mod rating_service_errors;
