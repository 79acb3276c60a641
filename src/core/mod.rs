//! Core modules for Placenote

pub mod catalog;
pub mod composer;
pub mod delivery;
pub mod differ;
pub mod gateway;
pub mod highlight;
pub mod image_cache;
pub mod logger;
pub mod ranker;
pub mod service;
pub mod working_set;

pub use catalog::{load_catalog, parse_catalog, Catalog};
pub use composer::{compose, NotificationComposer};
pub use delivery::{MemoryDelivery, NotificationDelivery, TerminalDelivery};
pub use differ::diff;
pub use gateway::{GatewayCall, RegionGateway, SimulatedGateway};
pub use highlight::highlight;
pub use image_cache::{HttpImageFetcher, ImageCache, ImageFetcher};
pub use logger::{EventLogger, FileEventLogger, MemoryEventLogger};
pub use ranker::{rank, top_k};
pub use service::{LocationReport, PlacenoteService, WorkingSetStatus};
pub use working_set::WorkingSetManager;
