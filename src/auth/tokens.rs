use anyhow::Context;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Opaque refresh token: 256 bits from the OS CSPRNG, base64url without padding.
pub fn generate_refresh_token() -> anyhow::Result<String> {
    let mut buf = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .context("os random source unavailable")?;
    Ok(Base64UrlUnpadded::encode_string(&buf))
}
