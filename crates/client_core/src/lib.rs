pub mod config;
pub mod error;
pub mod projection;
pub mod selection;
pub mod store;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use error::TransportError;
pub use selection::{ComparisonSelection, ToggleOutcome, MAX_COMPARISON};
pub use store::{DashboardState, DashboardStore, StoreEvent, StoreOptions, SubmissionUrl};
pub use transport::{
    FeedEvent, HttpRepositoryApi, RepositoryApi, StatusFeed, StatusSubscription,
    WebSocketStatusFeed,
};
