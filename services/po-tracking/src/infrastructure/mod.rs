//! 基础设施层

pub mod events;
pub mod health;
pub mod last_update;
pub mod persistence;
