//! Employees and the roster they are drawn from

pub mod employee;
pub mod supply;

pub use employee::{Employee, EmployeeView};
pub use supply::EntitySupply;
