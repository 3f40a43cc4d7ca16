pub mod elevenlabs_client;
