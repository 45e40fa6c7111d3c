pub(crate) mod ai_scoring;
pub(crate) mod assembly;
pub(crate) mod grading;
pub(crate) mod scoring;
