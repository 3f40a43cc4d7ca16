pub mod activities;
pub mod channels;
pub mod customers;
pub mod dubjobs;
pub mod job;
pub mod oauths;
pub mod users;
