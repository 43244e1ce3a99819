// Adapters layer: concrete implementations of the watchlist ports.

pub mod http;
