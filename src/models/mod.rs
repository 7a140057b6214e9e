pub mod page;
pub mod ticket;
