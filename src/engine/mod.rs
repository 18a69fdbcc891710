pub mod progression;
pub mod queue;
pub mod route;
pub mod snapshot;
pub mod tracking_number;
