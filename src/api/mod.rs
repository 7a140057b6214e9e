pub mod confluence;
pub mod jira;
pub mod transport;
