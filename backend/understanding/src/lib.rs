pub mod mock;
pub mod vision;

pub use mock::ScriptedVisionClient;
pub use vision::{HttpVisionClient, VisionProvider};
