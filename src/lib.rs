pub mod albums;
pub mod app;
pub mod auth;
pub mod comments;
pub mod common;
pub mod config;
pub mod db;
pub mod error;
pub mod friends;
pub mod likes;
pub mod posts;
pub mod resources;
pub mod state;
pub mod storage;
pub mod users;
