pub mod ask;
pub mod system_route;
