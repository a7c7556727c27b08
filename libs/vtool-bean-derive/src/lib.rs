use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Visibility};

/// Derive macro exposing a struct to the copy engine.
///
/// Generates two impls on the annotated struct:
///
/// - `vtool_bean::Typed` — kind `Record`, field-wise `zeroed()`.
/// - `vtool_bean::Record` — static field table in declaration order plus
///   index-based field accessors.
///
/// Fields declared `pub` are exported and take part in name matching.
/// Private and `pub(crate)` fields are unexported: they are only visited by
/// deep duplication. `#[bean(skip)]` hides a field from reflection entirely;
/// its zero value comes from `Default`.
///
/// The struct must implement `Clone`, and every field that is not skipped
/// must implement `vtool_bean::Typed`.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Record)]
/// pub struct User {
///     pub name: String,
///     pub age: u32,
///     password_hash: String,
///
///     #[bean(skip)]
///     cache: Option<std::sync::Arc<Session>>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(bean))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let mut field_infos = Vec::new();
    let mut zero_inits = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for field in fields {
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let ty = &field.ty;

        // Parse #[bean(...)] attribute.
        let mut skip = false;
        for attr in &field.attrs {
            if !attr.path().is_ident("bean") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown bean attribute (expected `skip`)"))
                }
            })?;
        }

        if skip {
            zero_inits.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let index = Literal::usize_unsuffixed(field_infos.len());
        let name_str = ident.unraw().to_string();
        let exported = matches!(field.vis, Visibility::Public(_));

        field_infos.push(quote! {
            ::vtool_bean::FieldInfo { name: #name_str, exported: #exported }
        });
        zero_inits.push(quote! { #ident: <#ty as ::vtool_bean::Typed>::zeroed() });
        getters.push(quote! {
            #index => ::core::option::Option::Some(&self.#ident as &dyn ::vtool_bean::Value),
        });
        setters.push(quote! {
            #index => ::core::option::Option::Some(&mut self.#ident as &mut dyn ::vtool_bean::Value),
        });
    }

    // Every type parameter must itself be reflectable.
    let mut generics = input.generics.clone();
    for param in input.generics.type_params() {
        let ident = &param.ident;
        generics
            .make_where_clause()
            .predicates
            .push(syn::parse_quote! { #ident: ::vtool_bean::Typed });
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::vtool_bean::Typed for #name #ty_generics #where_clause {
            const KIND: ::vtool_bean::Kind = ::vtool_bean::Kind::Record;

            fn zeroed() -> Self {
                Self {
                    #(#zero_inits),*
                }
            }

            fn view(&self) -> ::vtool_bean::ValueRef<'_> {
                ::vtool_bean::ValueRef::Record(self)
            }

            fn view_mut(&mut self) -> ::vtool_bean::ValueMut<'_> {
                ::vtool_bean::ValueMut::Record(self)
            }
        }

        impl #impl_generics ::vtool_bean::Record for #name #ty_generics #where_clause {
            fn fields(&self) -> &'static [::vtool_bean::FieldInfo] {
                const FIELDS: &[::vtool_bean::FieldInfo] = &[
                    #(#field_infos),*
                ];
                FIELDS
            }

            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::vtool_bean::Value> {
                match index {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::vtool_bean::Value> {
                match index {
                    #(#setters)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
