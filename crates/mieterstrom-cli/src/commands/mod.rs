pub mod loan;
pub mod project;
pub mod sensitivity;
