//! Procedural macros for Tableau bindable view-models.
//!
//! This crate provides `#[derive(Bindable)]` for structs and
//! `#[derive(BindableEnum)]` for fieldless enums. The generated code targets
//! the `tableau` crate and is re-exported from there.
//!
//! # Attributes
//!
//! ## `#[bind]`
//!
//! Field-level directives. Every named field is bound unless it is ignored or
//! its name starts with an underscore:
//!
//! ```ignore
//! #[derive(Bindable)]
//! struct Inbox {
//!     #[bind(first, caption = "Account")]
//!     account: String,
//!
//!     #[bind(section = "Messages", list = ListOptions::new().action(SelectionAction::Multiselection))]
//!     messages: ValueList,
//!
//!     #[bind(ignore)]
//!     cache: Vec<u8>,
//! }
//! ```
//!
//! Field attributes:
//! - `order = N`, `first`, `last`: Position on the screen
//! - `section = "header"`, `footer = "text"`: Start a new section
//! - `caption = "text"`, `row_height = 52.0`: Row presentation
//! - `skip`: Describe the field but show no row for it, as for selection mirrors
//! - `ignore`: Leave the field out of the schema entirely
//! - `read_only`: Refuse writes
//! - `list` or `list = <ListOptions>`: Bind as a list
//! - `element = Type`: Element type of a collection
//! - `view = <ViewType>`, `navigate_to = <ViewType>`: Custom views
//! - `entry` or `entry = <EntryOptions>`: Text entry cell
//! - `cell_editing = <CellEditing>`: Row editing on a list member
//!
//! ## `#[bindable]`
//!
//! Type-level configuration:
//!
//! ```ignore
//! #[derive(Bindable)]
//! #[bindable(caption = "Inbox", extend = Mailbox, display = Inbox::title, with = Inbox::commands)]
//! struct Inbox { /* ... */ }
//! ```
//!
//! - `caption = "text"`: Screen caption
//! - `extend = Type`: Declared base type
//! - `implements = Type`: Declared interface, repeatable
//! - `display = path`: `fn(&Self) -> String` used when the object is shown in a row
//! - `view = <ViewType>`, `cell_editing = <CellEditing>`: Type-wide directives
//! - `with = path`: `fn(&mut Schema<Self>)` run after the fields, for
//!   methods, background methods, computed members and bar buttons

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, Ident, LitFloat, LitInt, LitStr, Path, Token, Type,
    parse_macro_input, spanned::Spanned,
};

/// Derive macro for view-model structs.
///
/// Generates an implementation of `tableau::Bindable` whose `describe`
/// registers every bound field with its `#[bind(...)]` directives.
#[proc_macro_derive(Bindable, attributes(bindable, bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_bindable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive macro for fieldless enums bound as variant lists.
///
/// Generates `tableau::BindableEnum` and `tableau::FieldValue`, so the enum
/// can be used directly as a field of a `Bindable` struct.
#[proc_macro_derive(BindableEnum)]
pub fn derive_bindable_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_bindable_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct TypeAttrs {
    caption: Option<LitStr>,
    extend: Option<Type>,
    implements: Vec<Type>,
    display: Option<Path>,
    view: Option<Expr>,
    cell_editing: Option<Expr>,
    with: Option<Path>,
}

#[derive(Default)]
struct FieldAttrs {
    ignore: bool,
    skip: bool,
    read_only: bool,
    first: bool,
    last: bool,
    order: Option<LitInt>,
    section: Option<LitStr>,
    footer: Option<LitStr>,
    caption: Option<LitStr>,
    row_height: Option<LitFloat>,
    list: Option<Option<Expr>>,
    element: Option<Type>,
    view: Option<Expr>,
    navigate_to: Option<Expr>,
    entry: Option<Option<Expr>>,
    cell_editing: Option<Expr>,
}

struct BoundField {
    ident: Ident,
    attrs: FieldAttrs,
}

fn impl_derive_bindable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Bindable requires named fields; a unit struct has nothing to bind",
                ));
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Bindable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Bindable can only be derived for structs; use BindableEnum for enums",
            ));
        }
    };

    let type_attrs = parse_type_attrs(&input.attrs)?;

    let mut bound = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.ignore || ident.to_string().starts_with('_') {
            continue;
        }
        if attrs.first && attrs.last {
            return Err(syn::Error::new(
                field.span(),
                "`first` and `last` are mutually exclusive",
            ));
        }
        bound.push(BoundField { ident, attrs });
    }

    let type_directives = generate_type_directives(&type_attrs);
    let field_registrations = bound.iter().map(generate_field_registration);
    let extra = type_attrs.with.as_ref().map(|with| quote! { #with(schema); });
    let type_info = generate_type_info(&type_attrs);
    let display = type_attrs.display.as_ref().map(|display| {
        quote! {
            fn display(&self) -> ::std::string::String {
                #display(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tableau::Bindable for #name #ty_generics #where_clause {
            fn describe(schema: &mut ::tableau::Schema<Self>) {
                #type_directives
                #(#field_registrations)*
                #extra
            }

            #type_info
            #display
        }
    })
}

fn impl_derive_bindable_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "BindableEnum cannot be derived for generic enums",
        ));
    }

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "BindableEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "BindableEnum requires at least one variant",
        ));
    }

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "BindableEnum variants cannot carry fields",
            ));
        }
        variants.push(&variant.ident);
    }

    let names = variants.iter().map(|v| v.to_string());
    let indices = variants.iter().enumerate().map(|(i, v)| quote! { Self::#v => #i });

    Ok(quote! {
        impl ::tableau::BindableEnum for #name {
            const VARIANTS: &'static [Self] = &[#(Self::#variants),*];
            const NAMES: &'static [&'static str] = &[#(#names),*];

            fn index(self) -> usize {
                match self {
                    #(#indices,)*
                }
            }
        }

        impl ::tableau::FieldValue for #name {
            fn kind() -> ::tableau::MemberKind {
                ::tableau::MemberKind::enumeration::<Self>()
            }

            fn to_value(&self) -> ::tableau::Value {
                ::tableau::Value::Enum(::tableau::EnumValue::of(*self))
            }

            fn from_value(value: ::tableau::Value) -> ::std::option::Option<Self> {
                ::tableau::EnumValue::to_variant::<Self>(&value)
            }
        }
    })
}

fn parse_type_attrs(attrs: &[Attribute]) -> syn::Result<TypeAttrs> {
    let mut result = TypeAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("bindable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("caption") {
                result.caption = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("extend") {
                result.extend = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("implements") {
                result.implements.push(meta.value()?.parse()?);
            } else if meta.path.is_ident("display") {
                result.display = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("view") {
                result.view = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("cell_editing") {
                result.cell_editing = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("with") {
                result.with = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown bindable attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("bind") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("ignore") {
                result.ignore = true;
            } else if path.is_ident("skip") {
                result.skip = true;
            } else if path.is_ident("read_only") {
                result.read_only = true;
            } else if path.is_ident("first") {
                result.first = true;
            } else if path.is_ident("last") {
                result.last = true;
            } else if path.is_ident("order") {
                result.order = Some(meta.value()?.parse()?);
            } else if path.is_ident("section") {
                result.section = Some(meta.value()?.parse()?);
            } else if path.is_ident("footer") {
                result.footer = Some(meta.value()?.parse()?);
            } else if path.is_ident("caption") {
                result.caption = Some(meta.value()?.parse()?);
            } else if path.is_ident("row_height") {
                result.row_height = Some(meta.value()?.parse()?);
            } else if path.is_ident("element") {
                result.element = Some(meta.value()?.parse()?);
            } else if path.is_ident("view") {
                result.view = Some(meta.value()?.parse()?);
            } else if path.is_ident("navigate_to") {
                result.navigate_to = Some(meta.value()?.parse()?);
            } else if path.is_ident("cell_editing") {
                result.cell_editing = Some(meta.value()?.parse()?);
            } else if path.is_ident("list") {
                result.list = Some(optional_value(&meta)?);
            } else if path.is_ident("entry") {
                result.entry = Some(optional_value(&meta)?);
            } else {
                return Err(meta.error("unknown bind attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// `name` alone or `name = expr`.
fn optional_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<Option<Expr>> {
    if meta.input.peek(Token![=]) {
        Ok(Some(meta.value()?.parse()?))
    } else {
        Ok(None)
    }
}

fn generate_type_directives(attrs: &TypeAttrs) -> TokenStream2 {
    let caption = attrs.caption.as_ref().map(|c| quote! { schema.caption(#c); });
    let view = attrs.view.as_ref().map(|v| quote! { schema.view(#v); });
    let editing = attrs
        .cell_editing
        .as_ref()
        .map(|e| quote! { schema.cell_editing(#e); });
    quote! {
        #caption
        #view
        #editing
    }
}

fn generate_type_info(attrs: &TypeAttrs) -> Option<TokenStream2> {
    if attrs.extend.is_none() && attrs.implements.is_empty() {
        return None;
    }
    let extend = attrs.extend.as_ref().map(|base| {
        quote! { .extends(<#base as ::tableau::Bindable>::type_info()) }
    });
    let implements = attrs.implements.iter().map(|iface| quote! { .implements::<#iface>() });
    Some(quote! {
        fn type_info() -> ::tableau::TypeInfo {
            ::tableau::TypeInfo::of::<Self>()
                #extend
                #(#implements)*
        }
    })
}

fn generate_field_registration(field: &BoundField) -> TokenStream2 {
    let ident = &field.ident;
    let name = ident.to_string();
    let attrs = &field.attrs;

    let mut chain = Vec::new();
    if let Some(order) = &attrs.order {
        chain.push(quote! { .order(#order) });
    }
    if attrs.first {
        chain.push(quote! { .first() });
    }
    if attrs.last {
        chain.push(quote! { .last() });
    }
    if let Some(section) = &attrs.section {
        chain.push(quote! { .section(#section) });
    }
    if let Some(footer) = &attrs.footer {
        chain.push(quote! { .footer(#footer) });
    }
    if let Some(caption) = &attrs.caption {
        chain.push(quote! { .caption(#caption) });
    }
    if let Some(height) = &attrs.row_height {
        chain.push(quote! { .row_height(#height) });
    }
    if attrs.skip {
        chain.push(quote! { .skip() });
    }
    if attrs.read_only {
        chain.push(quote! { .read_only() });
    }
    if let Some(list) = &attrs.list {
        let options = list
            .as_ref()
            .map(|e| quote! { #e })
            .unwrap_or_else(|| quote! { ::tableau::ListOptions::new() });
        chain.push(quote! { .list(#options) });
    }
    if let Some(element) = &attrs.element {
        chain.push(quote! { .element::<#element>() });
    }
    if let Some(view) = &attrs.view {
        chain.push(quote! { .view(#view) });
    }
    if let Some(view) = &attrs.navigate_to {
        chain.push(quote! { .navigate_to(#view) });
    }
    if let Some(entry) = &attrs.entry {
        let options = entry
            .as_ref()
            .map(|e| quote! { #e })
            .unwrap_or_else(|| quote! { ::tableau::EntryOptions::new() });
        chain.push(quote! { .entry(#options) });
    }
    if let Some(editing) = &attrs.cell_editing {
        chain.push(quote! { .cell_editing(#editing) });
    }

    quote! {
        schema
            .field(#name, |s: &Self| &s.#ident, |s: &mut Self| &mut s.#ident)
            #(#chain)*;
    }
}
