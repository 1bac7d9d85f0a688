pub mod generate;
pub mod health;
pub mod questions;
pub mod users;
