pub mod controller;
pub mod dto;
pub mod repository;
pub mod service;
