pub mod checksum;
pub mod credentials;
pub mod http_client;
pub mod progress;
pub mod validating_http_body;
