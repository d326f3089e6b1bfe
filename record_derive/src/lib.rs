extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;

/// Derives `weft::project::FromRecord` (and `FromValue`) for a struct with named fields.
///
/// Each field is looked up under the lowerCamelCase spelling of its identifier
/// unless overridden with `#[record(rename = "key")]`.
#[proc_macro_derive(FromRecord, attributes(record))]
pub fn from_record_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };

    match impl_from_record(&ast) {
        Ok(gen) => gen.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_from_record(ast: &syn::DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let from_record_trait = quote! { weft::project::FromRecord };
    let from_value_trait = quote! { weft::project::FromValue };
    let record_type = quote! { weft::value::Record };
    let value_type = quote! { weft::value::Value };
    let project_result_type = quote! { weft::error::ProjectResult };

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let named = match &ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "`FromRecord` can only be derived for structs with named fields",
            ))
        }
    };

    let mut fname: Vec<&syn::Ident> = Vec::with_capacity(named.len());
    let mut key: Vec<String> = Vec::with_capacity(named.len());
    for field in named.iter() {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        fname.push(ident);
        key.push(field_key(field, ident)?);
    }

    Ok(quote! {
        impl #impl_generics #from_record_trait for #name #ty_generics #where_clause {
            fn from_record(record: &#record_type) -> #project_result_type<Self> {
                Ok(Self { #( #fname: record.project(#key)? ),* })
            }
        }

        impl #impl_generics #from_value_trait for #name #ty_generics #where_clause {
            fn from_value(value: &#value_type) -> #project_result_type<Self> {
                <Self as #from_record_trait>::from_record(
                    weft::project::expect_record(value)?
                )
            }
        }
    })
}

/// Resolves the record key for a field, honoring `#[record(rename = "...")]`.
fn field_key(field: &syn::Field, ident: &syn::Ident) -> syn::Result<String> {
    let mut key = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                key = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported `record` attribute; expected `rename = \"...\"`"))
            }
        })?;
    }
    Ok(key.unwrap_or_else(|| lower_camel(&ident.to_string())))
}

/// `bit_depth` becomes `bitDepth`; a raw-identifier prefix is dropped.
fn lower_camel(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = false;
    for c in ident.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
