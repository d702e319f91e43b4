pub mod album_service;
pub mod auth_service;
pub mod cart_service;
pub mod loader_service;
pub mod order_service;
pub mod review_service;
pub mod token_service;
pub mod user_service;
