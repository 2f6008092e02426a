pub mod academics;
pub mod attendance;
pub mod library;
pub mod notifications;
pub mod requests;
pub mod results;
pub mod users;

pub use academics::*;
pub use attendance::*;
pub use library::*;
pub use notifications::*;
pub use requests::*;
pub use results::*;
pub use users::*;
