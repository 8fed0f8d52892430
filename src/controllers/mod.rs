pub mod auth_controller;
pub mod customer_controller;
pub mod user_controller;
pub mod vehicle_controller;
