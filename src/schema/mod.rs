pub mod catalog;
pub mod commerce;
pub mod media;
pub mod models;
pub mod status;
