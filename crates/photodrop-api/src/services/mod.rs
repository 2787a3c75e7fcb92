pub mod consume;
pub mod relay;

pub use consume::ConsumeOnComplete;
pub use relay::{Checkout, RelayService, StoredObject};
