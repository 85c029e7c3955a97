mod read_model;

use proc_macro::TokenStream;

/// Derive macro implementing `kv_projections::ReadModel`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, ReadModel)]
/// #[read_model(collection = "counter_views")]
/// struct CounterView {
///     #[read_model(id)]
///     counter_id: u64,
///     value: i32,
/// }
/// ```
///
/// - `collection` defaults to the snake_case type name plus `s`.
/// - The id is the field marked `#[read_model(id)]`, or else the field named
///   `id`. Any `ToString` type works.
#[proc_macro_derive(ReadModel, attributes(read_model))]
pub fn derive_read_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    read_model::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
