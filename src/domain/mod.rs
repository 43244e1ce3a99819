// Domain layer: watchlist models and the ports the engine talks through.

pub mod model;
pub mod ports;
