// Application services
pub mod analyst;
