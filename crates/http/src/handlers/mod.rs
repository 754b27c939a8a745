pub mod admin;
pub mod backup;
pub mod measurements;
pub mod reports;
