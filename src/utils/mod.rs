pub mod cache;
pub mod data;
pub mod markets;
pub mod view;
