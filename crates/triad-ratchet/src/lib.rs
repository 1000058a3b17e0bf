pub mod double_ratchet;
pub mod sender_key;
pub mod types;
pub mod x3dh;

pub use double_ratchet::Header;
pub use sender_key::{decrypt_group, encrypt_group, GroupCiphertext, DISTRIBUTION_LEN};
pub use types::{IdentityKey, KeyBundle, OneTimePreKey, RatchetState, SenderKey, SignedPreKey};
pub use x3dh::{x3dh_initiate, x3dh_respond, X3dhResult};
