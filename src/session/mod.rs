pub mod input;
pub mod result;
pub mod settings;
pub mod test_session;

pub use input::Command;
pub use result::{SaveOutcome, TestSummary};
pub use settings::{Settings, TestMode};
pub use test_session::{Effect, SessionState, TestSession};
