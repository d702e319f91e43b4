pub mod albums;
pub mod auth;
pub mod carts;
pub mod data;
pub mod orders;
pub mod reviews;
pub mod users;
