pub mod accounts;
pub mod feedback;
pub mod health;
pub mod matches;
pub mod matching;
pub mod mentors;
pub mod metrics;
pub mod pagination;
pub mod reports;
pub mod sessions;
pub mod teams;
