pub mod fetch;
pub mod notify;
pub mod poll;
pub mod schema;
