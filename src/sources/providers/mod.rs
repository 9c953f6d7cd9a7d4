// src/sources/providers/mod.rs
pub mod elearning_industry;
pub mod learningguild;
pub mod remoteok;
pub mod weworkremotely;

pub use elearning_industry::ElearningIndustry;
pub use learningguild::LearningGuild;
pub use remoteok::RemoteOk;
pub use weworkremotely::WeWorkRemotely;
