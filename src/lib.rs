pub mod api;
pub mod client;
pub mod config;
pub mod form;
pub mod models;
pub mod remote;
pub mod view;
