//! # Gatewayエンドポイント

pub mod events;
pub mod health;
pub mod keys;
pub mod scan;

pub use events::{handle_events, handle_timeline};
pub use health::handle_health;
pub use keys::handle_keygen;
pub use scan::handle_scan;
