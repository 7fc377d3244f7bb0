//! Turns a contract instance's global key/value state back into a [`Listing`].

use crate::{
    codec::{base64_to_bytes, utf8_to_base64},
    error::DecodeError,
    models::{ApplicationInfo, Listing, TealKeyValue, TealValue},
};

pub const NAME: &str = "_name";
pub const IMAGE: &str = "_image";
pub const DESCRIPTION: &str = "_description";
pub const AMOUNT: &str = "_amount";
pub const STOCK: &str = "_stock";
pub const DISCOUNT: &str = "_discount";

/// Decodes one instance. `Ok(None)` means the ledger marks it deleted.
///
/// Absent fields fall back to `""` or `0` so that instances written by an older
/// schema still decode; a present field of the wrong shape is an error.
pub fn decode_listing(app: &ApplicationInfo) -> Result<Option<Listing>, DecodeError> {
    if app.deleted {
        return Ok(None);
    }
    let state = GlobalState(&app.params.global_state);

    Ok(Some(Listing {
        app_id: app.id,
        owner: app.params.creator.parse()?,
        name: state.text(NAME)?,
        image: state.text(IMAGE)?,
        description: state.text(DESCRIPTION)?,
        amount: state.uint(AMOUNT)?,
        stock: state.uint(STOCK)?,
        discount: state.uint(DISCOUNT)?,
    }))
}

struct GlobalState<'a>(&'a [TealKeyValue]);

impl GlobalState<'_> {
    fn find(&self, field: &str) -> Option<&TealValue> {
        let key = utf8_to_base64(field);
        self.0.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    fn text(&self, key: &'static str) -> Result<String, DecodeError> {
        let Some(value) = self.find(key) else {
            return Ok(String::new());
        };
        if value.kind != TealValue::BYTES {
            return Err(DecodeError::TypeMismatch { key });
        }
        let raw = base64_to_bytes(&value.bytes).map_err(|source| DecodeError::Base64 { key, source })?;
        String::from_utf8(raw).map_err(|source| DecodeError::Utf8 { key, source })
    }

    fn uint(&self, key: &'static str) -> Result<u64, DecodeError> {
        match self.find(key) {
            None => Ok(0),
            Some(value) if value.kind == TealValue::UINT => Ok(value.uint),
            Some(_) => Err(DecodeError::TypeMismatch { key }),
        }
    }
}
