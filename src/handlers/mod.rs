pub mod command;
pub mod media;
pub mod membership;
pub mod text;
pub mod ui;

pub use command::command_handler;
pub use media::media_handler;
pub use membership::membership_handler;
pub use text::text_handler;
