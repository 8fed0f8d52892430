pub mod customer;
pub mod user;
pub mod vehicle;
