pub mod account;
pub mod dubbing;
pub mod stripe_webhook;
pub mod tiktok_oauth;
