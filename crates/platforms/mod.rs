pub mod tiktok_client;
