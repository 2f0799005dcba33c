pub mod auth_service;
pub mod errors;
pub mod match_session_service;
pub mod matchmaking_service;
pub mod rating_service;
pub mod session_gateway;
pub mod timer_registry;
