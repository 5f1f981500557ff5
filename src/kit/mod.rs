//! Kit data model and construction: turning a validated font tree into
//! a playable kit with loaded sample waves (spec sections 3, 4.8, 4.9).

pub mod builder;
pub mod model;
pub mod robin;

pub use builder::build;
pub use model::{Drum, DrumFont, Kit, Robin, VelocityLayer};
pub use robin::RobinManager;
