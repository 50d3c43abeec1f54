//! Back-office route handlers

pub mod dashboard;
pub mod events;
pub mod members;
pub mod partners;
pub mod projects;
