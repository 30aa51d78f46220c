mod envelope;
mod user;

pub use envelope::Envelope;
pub use user::{BulkCreateReport, UserError, UserService};
