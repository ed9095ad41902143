mod executable;
mod manifest;
mod platform;
mod progress;

pub use executable::*;
pub use manifest::*;
pub use platform::*;
pub use progress::*;
