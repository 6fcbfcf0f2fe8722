pub mod data;
pub mod io;
pub mod printing;


pub use data::{ClientSettings, Config, SettingsOverrides};
pub use io::ConfigError;
