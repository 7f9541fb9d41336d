use proc_macro::TokenStream;
use syn::parse_macro_input;

mod resource;

/// Implements `vislum_handle_table::Resource` for a type that needs no close.
///
/// Extra membership can be declared with `#[resource(is(Kind, dyn Trait))]`.
#[proc_macro_derive(Resource, attributes(resource))]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);

    resource::derive_resource_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
