pub mod geo_controller;
pub mod order_controller;
pub mod rate_controller;
pub mod route_controller;
pub mod transportist_controller;
