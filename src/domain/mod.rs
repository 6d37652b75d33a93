// Domain layer: the ad composition model and the ports to external services.

pub mod image;
pub mod model;
pub mod options;
pub mod ports;
