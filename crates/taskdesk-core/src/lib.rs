pub mod access;
pub mod answer;
pub mod error;
pub mod search;
pub mod tag;
pub mod task;
pub mod user;

pub use error::TaskdeskError;
pub use tag::Tag;
pub use task::{Priority, Status, Task};
pub use user::User;
