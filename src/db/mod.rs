pub mod projects;
pub mod tasks;
pub mod time_entries;
pub mod users;
