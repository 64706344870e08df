pub mod error;
pub mod identity;
pub mod traits;
pub mod types;

pub use error::{ExtractionError, ExtractionExhausted, ValidationError};
pub use identity::{Identity, Restaurant, Role, User};
pub use traits::{MenuImage, VisionClient, VisionRequest, VisionResponse};
pub use types::{ExtractedMenu, FinalMenu, ItemId, Menu, MenuCategory, MenuItem};
