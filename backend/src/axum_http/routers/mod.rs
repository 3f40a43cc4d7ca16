pub mod activities;
pub mod channels;
pub mod customers;
pub mod dubjobs;
pub mod stripe_webhook;
pub mod tiktok;
