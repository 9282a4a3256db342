pub mod plant;
pub mod telemetry;
pub mod time;
pub mod window;

pub use plant::*;
pub use telemetry::*;
pub use time::*;
pub use window::*;
