pub mod category;
pub mod config;
pub mod contact;
pub mod gym_days;
pub mod habit;
pub mod session;
pub mod sleep;
pub mod summary;
pub mod workout;
