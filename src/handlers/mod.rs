pub mod auth;
pub mod collections;
pub mod garments;
pub mod tags;
