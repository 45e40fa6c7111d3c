pub(crate) mod ai_feedback;
pub(crate) mod questions;
pub(crate) mod skill_scores;
pub(crate) mod test_results;
pub(crate) mod user_answers;
pub(crate) mod users;
