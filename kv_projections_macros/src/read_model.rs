use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let collection = collection_name(input)?;
    let id_field = id_field(input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::kv_projections::ReadModel for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(&self.#id_field)
            }
        }
    })
}

fn collection_name(input: &DeriveInput) -> syn::Result<String> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("read_model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("collection name must not be empty"));
                }
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;
    }

    Ok(collection.unwrap_or_else(|| format!("{}s", snake_case(&input.ident.to_string()))))
}

fn id_field(input: &DeriveInput) -> syn::Result<Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "ReadModel requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "ReadModel can only be derived for structs",
            ))
        }
    };

    let mut marked = Vec::new();
    for field in fields {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("read_model")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    marked.push(field);
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;
        }
    }

    match marked.as_slice() {
        [field] => field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "id field must be named")),
        [] => fields
            .iter()
            .filter_map(|field| field.ident.clone())
            .find(|ident| ident == "id")
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    &input.ident,
                    "no field marked #[read_model(id)] and no field named `id`",
                )
            }),
        [_, second, ..] => Err(syn::Error::new_spanned(
            second,
            "only one field may be marked #[read_model(id)]",
        )),
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
