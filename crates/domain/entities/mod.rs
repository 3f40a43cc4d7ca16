pub mod activities;
pub mod channels;
pub mod customers;
pub mod dubjobs;
pub mod jobs;
pub mod oauths;
pub mod users;
