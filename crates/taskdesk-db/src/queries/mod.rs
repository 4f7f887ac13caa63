pub mod answers;
pub mod comments;
pub mod search;
pub mod tags;
pub mod tasks;
pub mod tokens;
pub mod users;
