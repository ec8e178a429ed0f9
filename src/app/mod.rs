pub mod model;
pub mod panel;
pub mod server;
pub mod source;
pub mod store;
