pub mod answer_store;
pub mod autosave;
pub mod clock;
pub mod integrity;
pub mod modality;
pub mod question_timer;
pub mod reporter;
pub mod session;
pub mod submission;

pub use session::{ExamSession, SessionHandle};
