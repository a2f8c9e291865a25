pub mod forms;
pub mod query;
pub mod views;
