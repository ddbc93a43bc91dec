pub mod app_command;
pub mod request;

pub use app_command::AppCommand;
pub use request::Request;
