pub mod extract;
pub mod password;
