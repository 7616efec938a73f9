pub mod catalog;
pub mod event;
pub mod schedule;
pub mod session;
