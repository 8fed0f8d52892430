pub mod customer_repository;
pub mod user_repository;
pub mod vehicle_repository;
