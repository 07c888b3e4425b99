//! Maps UI service errors to tomorrow_core::AppError for consistent user-facing messages.

mod weather;
