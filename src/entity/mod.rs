//! Store records. Cross-collection ids are plain columns with no foreign
//! keys: deleting an album leaves carts, orders and reviews untouched.

pub mod albums;
pub mod carts;
pub mod orders;
pub mod reviews;
pub mod users;

