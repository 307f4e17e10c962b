//! # automap-derive
//!
//! `#[derive(Mappable)]` for structs with named fields.
//!
//! Only `pub` fields are described and mapped. Other fields, and `pub`
//! fields marked `#[mappable(skip)]`, are rebuilt with `Default::default()`
//! by `from_value` and left untouched by `assign_value`.
//! A field marked `#[mappable(embed)]` is embedded: its own fields are
//! matched as if they were declared on the enclosing struct.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Field, Fields, Visibility};

/// Derive `automap::Mappable` for a struct.
#[proc_macro_derive(Mappable, attributes(mappable))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    embed: bool,
    skip: bool,
}

fn field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("mappable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embed") {
                attrs.embed = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported mappable attribute, expected `embed` or `skip`"))
            }
        })?;
    }

    if attrs.embed && attrs.skip {
        return Err(syn::Error::new_spanned(
            field,
            "a field cannot be both embedded and skipped",
        ));
    }
    Ok(attrs)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Mappable can only be derived for structs",
        ));
    };

    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Mappable requires named fields",
            ));
        }
    };

    let mut descriptors = Vec::new();
    let mut readers = Vec::new();
    let mut builders = Vec::new();
    let mut assigners = Vec::new();

    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let attrs = field_attrs(field)?;
        let exported = matches!(field.vis, Visibility::Public(_)) && !attrs.skip;

        if !exported {
            if attrs.embed {
                return Err(syn::Error::new_spanned(
                    field,
                    "embedded fields must be `pub`",
                ));
            }
            builders.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let name = ident.unraw().to_string();
        let embed = attrs.embed;
        descriptors.push(quote! {
            ::automap::FieldDef::new(#name, #embed, <#ty as ::automap::Mappable>::shape)
        });
        readers.push(quote! {
            ::automap::Mappable::to_value(&self.#ident)
        });
        builders.push(quote! {
            #ident: <#ty as ::automap::Mappable>::from_value(
                ::automap::value::next_field::<Self>(&mut fields, #name)?
            )?
        });
        assigners.push(quote! {
            ::automap::Mappable::assign_value(
                &mut self.#ident,
                ::automap::value::next_field::<Self>(&mut fields, #name)?,
            )?;
        });
    }

    let exported_count = assigners.len();
    let ident = &input.ident;
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::automap::Mappable));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::automap::Mappable for #ident #ty_generics #where_clause {
            fn shape() -> ::automap::Shape {
                ::automap::Shape::structure::<Self>(::std::vec![#(#descriptors),*])
            }

            fn to_value(&self) -> ::automap::Value {
                ::automap::Value::structure(
                    <Self as ::automap::Mappable>::shape(),
                    ::std::vec![#(#readers),*],
                )
            }

            fn from_value(value: ::automap::Value) -> ::automap::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut fields = value.into_fields::<Self>()?;
                ::core::result::Result::Ok(Self { #(#builders),* })
            }

            fn assign_value(&mut self, value: ::automap::Value) -> ::automap::Result<()> {
                #[allow(unused_mut, unused_variables)]
                let mut fields = value.into_fields::<Self>()?;
                if fields.len() != #exported_count {
                    return ::core::result::Result::Err(::automap::Error::reconstruct::<Self>(
                        ::std::format!(
                            "expected {} field values, found {}",
                            #exported_count,
                            fields.len(),
                        ),
                    ));
                }
                #(#assigners)*
                ::core::result::Result::Ok(())
            }
        }
    })
}
