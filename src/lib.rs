pub mod api;
pub mod app_config;
pub mod constants;
pub mod db;
pub mod error;
pub mod form;
pub mod lifecycle;
pub mod middleware;
pub mod orm;
pub mod permission;
pub mod principal;
pub mod service;
pub mod session;
pub mod slug;
pub mod view;
pub mod web;
