pub mod description;
pub mod resolver;
pub mod search;
