pub mod project;
pub mod task;
pub mod time_entry;
pub mod user;

pub use project::Project;
pub use task::Task;
pub use time_entry::TimeEntry;
pub use user::User;
