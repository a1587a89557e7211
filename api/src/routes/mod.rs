pub mod health_route;
pub mod history;
pub mod query;
pub mod root_route;
