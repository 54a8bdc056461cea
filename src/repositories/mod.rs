pub(crate) mod classes;
pub(crate) mod enrollments;
pub(crate) mod questions;
pub(crate) mod sessions;
pub(crate) mod submissions;
pub(crate) mod tests;
pub(crate) mod users;
