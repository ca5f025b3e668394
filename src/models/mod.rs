pub mod appointment;
pub mod daily_log;
pub mod data;
pub mod day_entry;
pub mod diary;
pub mod enums;
pub mod notification;
pub mod profile;
pub mod therapy;
pub mod voiding;

pub use appointment::*;
pub use daily_log::*;
pub use data::*;
pub use day_entry::*;
pub use diary::*;
pub use enums::*;
pub use notification::*;
pub use profile::*;
pub use therapy::*;
pub use voiding::*;
