pub mod counter;
pub mod health;
pub mod object_get;
pub mod upload;
