pub mod auth;
pub mod connection;
pub mod events;
pub mod game_match;
pub mod participant;
