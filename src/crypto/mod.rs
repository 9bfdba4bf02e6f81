pub use mask::{MaskingCipher, LOCAL_KEY_LEN};

mod mask;
