// Application intake and the read side over submitted applications.
// Handlers stay thin: intake.rs owns the write pipeline, query.rs owns projections.

pub mod handlers;
pub mod intake;
pub mod query;
