//! RC4 protection of the trust secret blob.
//!
//! `LsarCreateTrustedDomainEx2` expects the auth-info blob encrypted with
//! RC4 keyed by the 128-bit LSA session key. The primitive is fixed by the
//! protocol; replacing it breaks interoperability with AD domain controllers.

use rc4::consts::U16;
use rc4::{KeyInit, Rc4, StreamCipher};

use crate::{Result, TrustError};

/// Number of session key bytes that key the cipher.
pub const SESSION_KEY_LEN: usize = 16;

/// Encrypts `data` with RC4 keyed by the first 16 bytes of `session_key`.
///
/// RC4 is symmetric: applying it to the ciphertext gives the plaintext back.
///
/// # Errors
/// - [`TrustError::InvalidSessionKey`] if the session key holds fewer than 16 bytes.
///
/// # Examples
/// ```rust
/// # use ad_trust::cipher::arcfour_encrypt;
/// let key = [7u8; 16];
/// let ciphertext = arcfour_encrypt(&key, b"trust secret").unwrap();
/// assert_ne!(ciphertext, b"trust secret");
/// assert_eq!(arcfour_encrypt(&key, &ciphertext).unwrap(), b"trust secret");
/// ```
#[inline]
pub fn arcfour_encrypt(session_key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let key = session_key
        .get(..SESSION_KEY_LEN)
        .ok_or(TrustError::InvalidSessionKey {
            len: session_key.len(),
        })?;
    let mut cipher = Rc4::<U16>::new_from_slice(key).map_err(|_| TrustError::InvalidSessionKey {
        len: session_key.len(),
    })?;
    let mut buffer = data.to_vec();
    cipher.apply_keystream(&mut buffer);
    Ok(buffer)
}
