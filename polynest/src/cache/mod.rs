pub mod key;
pub mod store;

#[doc(inline)]
pub use key::{MAX_ROTATIONS, MAX_SOURCE, NfpKey, NfpKeyParts, to_rotation_angle, to_rotation_index};
#[doc(inline)]
pub use store::NfpStore;
