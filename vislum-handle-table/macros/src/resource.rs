use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{DeriveInput, Meta, Token, Type};

/// Parse every #[resource(is(A, B, ...))] attribute into the listed kinds.
fn parse_resource_kinds(input: &DeriveInput) -> syn::Result<Vec<Type>> {
    let mut kinds = Vec::new();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("resource")) {
        let meta_list = attr
            .meta
            .require_list()
            .map_err(|_| syn::Error::new_spanned(attr, "Expected #[resource(...)] with parameters"))?;

        let metas = Punctuated::<Meta, Token![,]>::parse_terminated
            .parse2(meta_list.tokens.clone())
            .map_err(|_| syn::Error::new_spanned(attr, "Invalid syntax in #[resource(...)] attribute"))?;

        for meta in metas {
            if !meta.path().is_ident("is") {
                return Err(syn::Error::new_spanned(
                    &meta,
                    "Unknown parameter in #[resource(...)] attribute",
                ));
            }

            let Meta::List(list) = &meta else {
                return Err(syn::Error::new_spanned(
                    &meta,
                    "Expected 'is' to be is(Type, ...)",
                ));
            };

            let types = Punctuated::<Type, Token![,]>::parse_terminated
                .parse2(list.tokens.clone())?;

            if types.is_empty() {
                return Err(syn::Error::new_spanned(
                    &meta,
                    "is(...) needs at least one resource type",
                ));
            }

            kinds.extend(types);
        }
    }

    Ok(kinds)
}

pub fn derive_resource_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let kinds = parse_resource_kinds(&input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics vislum_handle_table::Resource for #ident #ty_generics #where_clause {
            fn is_type(&self, ty: vislum_handle_table::ResourceType) -> bool {
                ty.is::<Self>() #( || ty.is::<#kinds>() )*
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn derive_error(input: DeriveInput) -> String {
        derive_resource_impl(input).unwrap_err().to_string()
    }

    #[test]
    fn test_plain_derive() {
        let tokens = derive_resource_impl(parse_quote! {
            struct Timer(u64);
        })
        .unwrap()
        .to_string();

        assert!(tokens.contains("fn is_type"));
        assert!(tokens.contains("ty . is :: < Self > ()"));
    }

    #[test]
    fn test_derive_with_kinds() {
        let tokens = derive_resource_impl(parse_quote! {
            #[resource(is(Stream, Readable))]
            struct Pipe;
        })
        .unwrap()
        .to_string();

        assert!(tokens.contains("ty . is :: < Stream > ()"));
        assert!(tokens.contains("ty . is :: < Readable > ()"));
    }

    #[test]
    fn test_derive_generic() {
        let tokens = derive_resource_impl(parse_quote! {
            struct Wrapper<T: 'static>(T);
        })
        .unwrap()
        .to_string();

        assert!(tokens.contains("for Wrapper < T >"));
    }

    #[test]
    fn test_missing_list() {
        let err = derive_error(parse_quote! {
            #[resource]
            struct Pipe;
        });
        assert_eq!(err, "Expected #[resource(...)] with parameters");
    }

    #[test]
    fn test_unknown_parameter() {
        let err = derive_error(parse_quote! {
            #[resource(close)]
            struct Pipe;
        });
        assert_eq!(err, "Unknown parameter in #[resource(...)] attribute");
    }

    #[test]
    fn test_is_without_list() {
        let err = derive_error(parse_quote! {
            #[resource(is = Stream)]
            struct Pipe;
        });
        assert_eq!(err, "Expected 'is' to be is(Type, ...)");
    }

    #[test]
    fn test_empty_is() {
        let err = derive_error(parse_quote! {
            #[resource(is())]
            struct Pipe;
        });
        assert_eq!(err, "is(...) needs at least one resource type");
    }
}
