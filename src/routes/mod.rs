mod health_check;
mod login;
pub mod users;

pub use health_check::*;
pub use login::*;
