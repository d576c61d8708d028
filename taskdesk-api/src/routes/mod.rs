/// API route handlers, one module per resource
///
/// - `health`: Health check endpoint
/// - `users`: User CRUD and statistics
/// - `tasks`: Task CRUD, comments, status changes and overdue listing

pub mod health;
pub mod tasks;
pub mod users;
