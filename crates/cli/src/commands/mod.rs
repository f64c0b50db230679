pub mod corpus;
pub mod dirs;
pub mod file;
pub mod languages;
pub mod runs;
pub mod stream;
pub mod util;

pub use corpus::*;
pub use dirs::*;
pub use file::*;
pub use languages::*;
pub use runs::*;
pub use stream::*;
pub use util::*;
