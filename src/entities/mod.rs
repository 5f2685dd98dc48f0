pub mod prelude;

pub mod assignments;
pub mod submissions;
pub mod users;
