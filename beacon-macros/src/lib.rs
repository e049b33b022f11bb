//! Procedural macros backing the Beacon SDK's error handling conventions.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Variant};

/// Procedural macro that turns a plain enum into a Beacon error enum.
///
/// This macro automatically:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Adds a `Generic { message: String }` variant if not already present
/// 3. Implements `From<anyhow::Error>`, flattening the context chain into the message
///
/// # Usage
///
/// ```rust,ignore
/// #[beacon_error]
/// pub enum MyError {
///     #[error("specific error: {code}")]
///     Specific { code: u32 },
/// }
/// ```
#[proc_macro_attribute]
pub fn beacon_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Enum(data_enum) => {
            let enum_name = &input.ident;
            let visibility = &input.vis;
            let generics = &input.generics;

            // Drop any caller-provided derive/uniffi attributes so ours don't conflict.
            let attrs: Vec<_> = input
                .attrs
                .iter()
                .filter(|attr| {
                    !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi")
                })
                .collect();

            let has_generic = data_enum
                .variants
                .iter()
                .any(|variant| variant.ident == "Generic");

            let mut variants = data_enum.variants.clone();

            if !has_generic {
                let generic_variant: Variant = syn::parse_quote! {
                    /// A generic error that can wrap any anyhow error.
                    #[error("Generic error: {message}")]
                    Generic {
                        /// The error message from the wrapped error.
                        message: String
                    }
                };
                variants.push(generic_variant);
            }

            quote! {
                #[derive(Debug, thiserror::Error, uniffi::Error)]
                #[uniffi(flat_error)]
                #(#attrs)*
                #visibility enum #enum_name #generics {
                    #variants
                }

                impl #generics From<anyhow::Error> for #enum_name #generics {
                    fn from(err: anyhow::Error) -> Self {
                        Self::Generic {
                            message: {
                                let mut message = err.to_string();

                                // Append the rest of the error chain for context.
                                let chain: Vec<String> = err.chain().skip(1).map(|e| e.to_string()).collect();
                                if !chain.is_empty() {
                                    message.push_str(" (caused by: ");
                                    message.push_str(&chain.join(" -> "));
                                    message.push(')');
                                }

                                message
                            }
                        }
                    }
                }

                impl #generics #enum_name #generics {
                    /// Convert an `anyhow::Result` to a `Result` with this error type
                    pub fn from_anyhow_result<T>(result: anyhow::Result<T>) -> Result<T, Self> {
                        result.map_err(Self::from)
                    }
                }
            }
        }
        _ => {
            return syn::Error::new_spanned(
                &input,
                "beacon_error can only be applied to enums",
            )
            .to_compile_error()
            .into();
        }
    };

    TokenStream::from(expanded)
}
