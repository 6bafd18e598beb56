// Reference data
pub mod catalog;
pub mod users;

// Consumption tracking
pub mod consumption;
pub mod notifications;

// Dashboard rollups
pub mod analytics;
