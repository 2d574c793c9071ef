pub mod assertions;
pub mod config;
pub mod fpa;

#[doc(inline)]
pub use config::PackedConfig;
#[doc(inline)]
pub use fpa::{TOL, almost_equal};
