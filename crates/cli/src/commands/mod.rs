pub mod info;
pub mod sources;
pub mod stages;
pub mod util;

pub use info::*;
pub use sources::*;
pub use stages::*;
pub use util::*;
