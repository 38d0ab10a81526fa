pub mod application;
pub mod health;
pub mod interview;
pub mod round;
