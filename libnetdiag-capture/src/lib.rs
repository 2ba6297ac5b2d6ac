mod buffer;
mod classify;
mod decode;
mod interface;
mod monitor;
mod probe;
mod record;
mod session;
mod source;

pub use buffer::*;
pub use classify::*;
pub use decode::*;
pub use interface::*;
pub use monitor::*;
pub use probe::*;
pub use record::*;
pub use session::*;
pub use source::*;
