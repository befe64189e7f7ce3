pub mod artifact;
pub mod broadcast;
pub mod inference;
pub mod logging;
pub mod registry;
pub mod services;
pub mod validator;
