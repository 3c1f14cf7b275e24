// Sprinty utilities - logging and small formatting helpers

pub mod logging;
pub mod paths;
pub mod strings;

pub use logging::*;
pub use paths::*;
pub use strings::*;
