//! `span_fn` procedural macro
//!
//! Injects a scoped span covering the body of a sync function.

use proc_macro2::Literal;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream, Result},
    parse_macro_input, parse_quote, ItemFn,
};

struct TraceArgs {
    alternative_name: Option<Literal>,
}

impl Parse for TraceArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        if input.is_empty() {
            Ok(Self {
                alternative_name: None,
            })
        } else {
            Ok(Self {
                alternative_name: Some(Literal::parse(input)?),
            })
        }
    }
}

/// Wraps the function body in a span named after the function (or after the
/// literal passed as an argument). Async functions are rejected: an
/// ambient-context span must open and close on one thread.
#[proc_macro_attribute]
pub fn span_fn(
    args: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(args as TraceArgs);
    let mut function = parse_macro_input!(input as ItemFn);

    if function.sig.asyncness.is_some() {
        return syn::Error::new_spanned(
            &function.sig.fn_token,
            "span_fn does not support async functions",
        )
        .to_compile_error()
        .into();
    }

    let span_name = match args.alternative_name {
        Some(literal) => quote!(#literal),
        None => {
            let ident = function.sig.ident.to_string();
            quote!(concat!(module_path!(), "::", #ident))
        }
    };

    function.block.stmts.insert(0, parse_quote! {
        causeway_tracing::span_scope!(_CAUSEWAY_FN_METADATA, #span_name);
    });

    proc_macro::TokenStream::from(quote! {
        #function
    })
}
