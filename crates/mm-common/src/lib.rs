pub mod api;
pub mod ids;
pub mod logging;
pub mod matching;
pub mod model;
pub mod service;
pub mod store;

pub use matching::{rank, score, MatchFactors, MatchingError, RankedMentor, Weights};
pub use model::{AvailabilitySlot, Mentor, Modality, Team, Weekday};
pub use service::{MentorshipService, ServiceError};
pub use store::{MemoryStore, PgStore, Store, StoreError};
