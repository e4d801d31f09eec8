pub mod event;
pub mod observation;

pub use event::*;
pub use observation::*;
