pub mod section;
pub mod style;

pub use section::{ContentSection, SectionField, SectionId};
pub use style::DEFAULT_GLOBAL_STYLE;
