pub mod entities;
pub mod ordering;
pub mod todo_repo;
pub mod user_repo;
