use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr};

/// Per-field options parsed from `#[record(...)]`.
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    readonly: bool,
    rename: Option<LitStr>,
}

fn field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("readonly") {
                options.readonly = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute"))
            }
        })?;
    }
    Ok(options)
}

/// Derives `tether_core::Record` for a struct with named fields.
///
/// Every field that is not `#[record(skip)]` becomes an entry in a static
/// descriptor table, readable and writable as a `serde_json::Value`. Field
/// types therefore need `Serialize`, plus `DeserializeOwned` unless the field
/// is `#[record(readonly)]`. `#[record(rename = "name")]` changes the
/// dynamic name.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Record requires named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs",
            ));
        }
    };

    let ty = &input.ident;
    let mut helpers = Vec::new();
    let mut descriptors = Vec::new();
    let mut names = Vec::new();

    for field in named {
        let options = field_options(&field.attrs)?;
        if options.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_ty = &field.ty;
        let plain = ident.unraw();
        let name = options
            .rename
            .map(|lit| lit.value())
            .unwrap_or_else(|| plain.to_string());
        if names.contains(&name) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("duplicate record field name `{name}`"),
            ));
        }

        let read_ident = Ident::new(&format!("__read_{plain}"), Span::call_site());
        helpers.push(quote! {
            fn #read_ident(
                record: &#ty,
            ) -> ::core::result::Result<tether_core::__private::serde_json::Value, tether_core::__private::serde_json::Error> {
                tether_core::__private::serde_json::to_value(&record.#ident)
            }
        });

        let write = if options.readonly {
            quote! { ::core::option::Option::None }
        } else {
            let write_ident = Ident::new(&format!("__write_{plain}"), Span::call_site());
            helpers.push(quote! {
                fn #write_ident(
                    record: &mut #ty,
                    value: tether_core::__private::serde_json::Value,
                ) -> ::core::result::Result<(), tether_core::__private::serde_json::Error> {
                    record.#ident = tether_core::__private::serde_json::from_value::<#field_ty>(value)?;
                    ::core::result::Result::Ok(())
                }
            });
            quote! { ::core::option::Option::Some(#write_ident) }
        };

        descriptors.push(quote! {
            tether_core::record::FieldDescriptor {
                name: #name,
                read: #read_ident,
                write: #write,
            }
        });
        names.push(name);
    }

    let count = descriptors.len();
    Ok(quote! {
        const _: () = {
            #(#helpers)*

            static DESCRIPTORS: [tether_core::record::FieldDescriptor<#ty>; #count] = [
                #(#descriptors),*
            ];
            static TABLE: tether_core::record::FieldTable<#ty> =
                tether_core::record::FieldTable::new(&DESCRIPTORS);

            impl tether_core::record::Record for #ty {
                fn field_names(&self) -> ::std::vec::Vec<&str> {
                    TABLE.names()
                }

                fn read_field(
                    &self,
                    name: &str,
                ) -> ::core::result::Result<tether_core::__private::serde_json::Value, tether_core::record::FieldError> {
                    TABLE.read(self, name)
                }

                fn write_field(
                    &mut self,
                    name: &str,
                    value: tether_core::__private::serde_json::Value,
                ) -> ::core::result::Result<(), tether_core::record::FieldError> {
                    TABLE.write(self, name, value)
                }
            }
        };
    })
}
