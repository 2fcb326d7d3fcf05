// Live feed exports
pub mod broadcaster;
pub mod filter;

pub use broadcaster::{format_sse, FeedConnection, FeedRegistry, Subscription};
pub use filter::{EventMeta, SubscriberFilter};
