pub mod question;
pub mod question_time;
pub mod test_attempt;
