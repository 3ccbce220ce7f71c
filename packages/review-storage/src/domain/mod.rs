//! Domain layer: entities, the document view type, and gateway ports

pub mod models;
pub mod ports;
pub mod view;

pub use models::{Appeal, AppealStatus, Media, Reply, Review, ReviewStatus};
pub use ports::{
    CacheGateway, IdGenerator, ReviewAudit, ReviewStore, ReviewTx, SearchFilter, SearchGateway,
    SearchPage,
};
pub use view::{ReviewView, VIEW_TIME_FORMAT};
