pub mod classifier;
pub mod config;
pub mod encode;
pub mod handbrake;
pub mod probe;
pub mod scan;

pub use classifier::ClassifyError;
pub use config::EncodeSettings;
pub use encode::EncodeArgs;
pub use handbrake::HandBrake;
pub use probe::{Disc, Title};
