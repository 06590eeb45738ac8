mod base;
mod dashboard;
mod provisioner;
mod stream;
mod templates;

pub use base::*;
pub use dashboard::*;
pub use provisioner::*;
pub use stream::*;
pub use templates::*;
