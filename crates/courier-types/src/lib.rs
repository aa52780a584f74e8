pub mod api;
pub mod filters;
pub mod models;
pub mod validator;
