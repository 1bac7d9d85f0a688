pub mod migrations;
pub mod question_sets;
pub mod responses;
pub mod users;
