pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskQuery, TaskUpdate};
pub use user::{User, UserCredentials};
