#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Not an issue in a macro crate"
)]
//! Procedural macro for compile-time security identifier (SID) literals.
mod core;
use core::sid_impl;
use proc_macro::TokenStream;

use syn::{LitStr, parse_macro_input};

/// Parses a SID literal at compile time and expands to a constant
/// `ad_trust::SecurityIdentifier`.
///
/// ```ignore
/// const DOMAIN: ad_trust::SecurityIdentifier = ad_trust::sid!("S-1-5-21-100-200-300");
/// ```
#[proc_macro]
pub fn sid(input: TokenStream) -> TokenStream {
    let lit = parse_macro_input!(input as LitStr);
    match sid_impl(&lit) {
        Ok(token_stream) => token_stream,
        Err(err) => err.to_compile_error(),
    }
    .into()
}
