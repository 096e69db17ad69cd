use crate::errors::ProviderResult;
use crate::provider::ReferenceProvider;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Fetches a sprite and returns it base64-encoded.
pub fn sprite_base64<P: ReferenceProvider + ?Sized>(
    provider: &P,
    sprite_id: u32,
) -> ProviderResult<String> {
    let bytes = provider.sprite_bytes(sprite_id)?;
    Ok(STANDARD.encode(bytes))
}

/// Resolves `name` and fetches its sprite.
pub fn creature_image<P: ReferenceProvider + ?Sized>(
    provider: &P,
    name: &str,
) -> ProviderResult<String> {
    let profile = provider.resolve(name)?;
    sprite_base64(provider, profile.sprite_id)
}

/// Like `creature_image`, but a missing sprite is not an error.
pub fn optional_image<P: ReferenceProvider + ?Sized>(provider: &P, name: &str) -> Option<String> {
    match creature_image(provider, name) {
        Ok(image) => Some(image),
        Err(err) => {
            log::debug!("no sprite for {}: {}", name, err);
            None
        }
    }
}
