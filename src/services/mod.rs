pub(crate) mod attempt;
pub(crate) mod catalog;
pub(crate) mod grading;
pub(crate) mod templates;
