//! Compile-time introspection for `restwrap`.
//!
//! `#[rest_api]` is placed on an inherent `impl` block. Every `pub fn` taking
//! `&self` becomes a [`MethodDescriptor`] in a generated `RestApi` impl, with an
//! invoker closure that pulls typed arguments, calls the method and serializes
//! the result. Methods without a receiver, non-public methods and methods marked
//! `#[rest(skip)]` are left alone.
//!
//! ```rust,ignore
//! #[rest_api]
//! impl Registry {
//!     #[rest(name = "Set")]
//!     pub fn set_name(&self, name: String) { /* ... */ }
//!
//!     #[rest(name = "Set")]
//!     pub fn set_record(&self, record: Record) { /* ... */ }
//!
//!     pub fn lookup(&self, #[rest(name = "Key")] key: String) -> Option<Record> { /* ... */ }
//! }
//! ```
//!
//! A method returning `Result<T, E>` reports `Err` as an invocation failure.
//! `E` may be any `std::error::Error + Send + Sync`, `anyhow::Error`, `String`
//! or `&'static str`.
//!
//! [`MethodDescriptor`]: ../restwrap/introspect/struct.MethodDescriptor.html

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat,
    PathArguments, PathSegment, Receiver, Result as SynResult, ReturnType, Token, Type, Visibility,
};

enum RestOption {
    Name(LitStr),
    Skip,
}

impl Parse for RestOption {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "name" => {
                input.parse::<Token![=]>()?;
                Ok(RestOption::Name(input.parse()?))
            }
            "skip" => Ok(RestOption::Skip),
            other => Err(syn::Error::new(
                ident.span(),
                format!("unexpected rest option {}", other),
            )),
        }
    }
}

#[derive(Default)]
struct RestOptions {
    name: Option<LitStr>,
    skip: bool,
}

/// Remove every `#[rest(...)]` attribute from `attrs` and merge its options.
fn take_rest_options(attrs: &mut Vec<Attribute>) -> SynResult<RestOptions> {
    let mut options = RestOptions::default();
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if !attr.path().is_ident("rest") {
            kept.push(attr);
            continue;
        }
        let parsed =
            attr.parse_args_with(Punctuated::<RestOption, Token![,]>::parse_terminated)?;
        for option in parsed {
            match option {
                RestOption::Name(name) => options.name = Some(name),
                RestOption::Skip => options.skip = true,
            }
        }
    }
    *attrs = kept;
    Ok(options)
}

fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last(),
        Type::Group(g) => last_segment(&g.elem),
        Type::Paren(p) => last_segment(&p.elem),
        _ => None,
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(t) if t.elems.is_empty())
}

/// Classify a declared type into a `TypeTag` expression.
///
/// The primitive set is matched on the last path segment, so `i64`,
/// `rust_decimal::Decimal` and `chrono::NaiveDateTime` are all recognized.
/// Anything else is complex and can only travel in a request body.
fn type_tag(ty: &Type) -> (bool, TokenStream2) {
    let primitive = last_segment(ty)
        .filter(|seg| seg.arguments.is_none())
        .and_then(|seg| match seg.ident.to_string().as_str() {
            "i32" => Some(quote!(Int32)),
            "i64" => Some(quote!(Int64)),
            "Decimal" => Some(quote!(Decimal)),
            "String" => Some(quote!(String)),
            "NaiveDateTime" => Some(quote!(DateTime)),
            _ => None,
        });
    match primitive {
        Some(variant) => (true, quote!(::restwrap::TypeTag::#variant)),
        None => {
            let name = ty.to_token_stream().to_string().replace(' ', "");
            (false, quote!(::restwrap::TypeTag::Complex(#name)))
        }
    }
}

/// `Some(T)` when `ty` is spelled `Result<T, ..>` (including single-argument aliases).
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let seg = last_segment(ty)?;
    if seg.ident != "Result" {
        return None;
    }
    match &seg.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        }),
        _ => None,
    }
}

/// `&self`, `&'a self` or the typed spelling `self: &Self`.
///
/// syn fills `Receiver::ty` for every spelling, so the type alone decides.
fn is_shared_self(receiver: &Receiver) -> bool {
    match receiver.ty.as_ref() {
        Type::Reference(r) if r.mutability.is_none() => {
            matches!(r.elem.as_ref(), Type::Path(p) if p.qself.is_none() && p.path.is_ident("Self"))
        }
        _ => false,
    }
}

struct ExposedParam {
    ident: Ident,
    ty: Type,
    exposed: String,
    primitive: bool,
    tag: TokenStream2,
}

/// Build the `MethodDescriptor` expression for one method, stripping its
/// `#[rest]` attributes in place. Returns `Ok(None)` for methods that are not
/// exposed.
fn describe_method(method: &mut ImplItemFn) -> SynResult<Option<TokenStream2>> {
    let options = take_rest_options(&mut method.attrs)?;
    let is_public = matches!(method.vis, Visibility::Public(_));

    let exposed = match method.sig.receiver() {
        Some(_) if options.skip || !is_public => false,
        Some(receiver) if !is_shared_self(receiver) => {
            return Err(syn::Error::new(
                receiver.span(),
                "exposed methods must take `&self`; the wrapped object is shared across concurrent requests",
            ));
        }
        Some(_) => true,
        None => false,
    };

    let mut params = Vec::new();
    for input in method.sig.inputs.iter_mut() {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let param_options = take_rest_options(&mut typed.attrs)?;
        if !exposed {
            continue;
        }
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.clone(),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "exposed method parameters must be plain identifiers",
                ))
            }
        };
        let exposed_as = param_options
            .name
            .map(|n| n.value())
            .unwrap_or_else(|| ident.to_string());
        let ty = typed.ty.as_ref().clone();
        let (primitive, tag) = type_tag(&ty);
        params.push(ExposedParam {
            ident,
            ty,
            exposed: exposed_as,
            primitive,
            tag,
        });
    }

    if !exposed {
        return Ok(None);
    }
    if method.sig.asyncness.is_some() {
        return Err(syn::Error::new(
            method.sig.span(),
            "async methods cannot be exposed",
        ));
    }
    if method.sig.generics.type_params().next().is_some() {
        return Err(syn::Error::new(
            method.sig.generics.span(),
            "generic methods cannot be exposed",
        ));
    }

    let fn_ident = &method.sig.ident;
    let exposed_name = options
        .name
        .map(|n| n.value())
        .unwrap_or_else(|| fn_ident.to_string());

    let descriptors = params.iter().map(|p| {
        let name = &p.exposed;
        let tag = &p.tag;
        quote!(::restwrap::ParameterDescriptor::new(#name, #tag))
    });
    let extractions = params.iter().map(|p| {
        let ident = &p.ident;
        let ty = &p.ty;
        if p.primitive {
            quote!(let #ident: #ty = __args.next_value()?;)
        } else {
            quote!(let #ident: #ty = __args.next_body()?;)
        }
    });
    let idents = params.iter().map(|p| &p.ident);
    let call = quote!(__this.#fn_ident(#(#idents),*));

    let encode = quote! {
        ::restwrap::codec::serialize(&__ret)
            .map(::std::option::Option::Some)
            .map_err(::restwrap::InvocationError::Encode)
    };
    let (return_type, body) = match &method.sig.output {
        ReturnType::Default => (
            quote!(::restwrap::ReturnType::Void),
            quote! {
                #call;
                ::std::result::Result::Ok(::std::option::Option::None)
            },
        ),
        ReturnType::Type(_, ty) if is_unit(ty) => (
            quote!(::restwrap::ReturnType::Void),
            quote! {
                #call;
                ::std::result::Result::Ok(::std::option::Option::None)
            },
        ),
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) if is_unit(ok) => (
                quote!(::restwrap::ReturnType::Void),
                quote! {
                    #call.map_err(::restwrap::InvocationError::failed)?;
                    ::std::result::Result::Ok(::std::option::Option::None)
                },
            ),
            Some(ok) => {
                let (_, tag) = type_tag(ok);
                (
                    quote!(::restwrap::ReturnType::Value(#tag)),
                    quote! {
                        let __ret = #call.map_err(::restwrap::InvocationError::failed)?;
                        #encode
                    },
                )
            }
            None => {
                let (_, tag) = type_tag(ty);
                (
                    quote!(::restwrap::ReturnType::Value(#tag)),
                    quote! {
                        let __ret = #call;
                        #encode
                    },
                )
            }
        },
    };

    Ok(Some(quote! {
        ::restwrap::MethodDescriptor::new(
            #exposed_name,
            ::std::vec![#(#descriptors),*],
            #return_type,
            |__this: &Self, __args: &mut ::restwrap::Arguments|
                -> ::std::result::Result<::std::option::Option<::std::string::String>, ::restwrap::InvocationError>
            {
                #(#extractions)*
                #body
            },
        )
    }))
}

/// Implements `restwrap::RestApi` for the type of an inherent `impl` block.
///
/// Exposed methods keep discovery order, which is also the order the
/// introspector groups overloads in. Two methods that share an exposed name
/// (`#[rest(name = "...")]`) form an overload group.
#[proc_macro_attribute]
pub fn rest_api(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let err = syn::Error::new(
            TokenStream2::from(attr).span(),
            "#[rest_api] takes no arguments",
        );
        return err.to_compile_error().into();
    }
    let mut input = parse_macro_input!(item as ItemImpl);
    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new(path.span(), "#[rest_api] must be placed on an inherent impl block")
            .to_compile_error()
            .into();
    }

    let mut descriptors = Vec::new();
    let mut errors: Option<syn::Error> = None;
    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            match describe_method(method) {
                Ok(Some(descriptor)) => descriptors.push(descriptor),
                Ok(None) => {}
                Err(e) => match errors.as_mut() {
                    Some(existing) => existing.combine(e),
                    None => errors = Some(e),
                },
            }
        }
    }
    if let Some(e) = errors {
        let compile_error = e.to_compile_error();
        return quote!(#input #compile_error).into();
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        #input

        impl #impl_generics ::restwrap::RestApi for #self_ty #where_clause {
            fn methods() -> ::std::vec::Vec<::restwrap::MethodDescriptor<Self>> {
                ::std::vec![#(#descriptors),*]
            }
        }
    };
    TokenStream::from(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn receiver_of(method: &ImplItemFn) -> &Receiver {
        method.sig.receiver().expect("method has a receiver")
    }

    #[test]
    fn test_shared_receivers_are_accepted() {
        let plain: ImplItemFn = parse_quote!(pub fn a(&self) {});
        let named: ImplItemFn = parse_quote!(pub fn b(&'a self) {});
        let typed: ImplItemFn = parse_quote!(pub fn c(self: &Self) {});
        for method in [&plain, &named, &typed] {
            assert!(is_shared_self(receiver_of(method)), "{}", method.sig.ident);
        }
    }

    #[test]
    fn test_other_receivers_are_rejected() {
        let exclusive: ImplItemFn = parse_quote!(pub fn a(&mut self) {});
        let owned: ImplItemFn = parse_quote!(pub fn b(self) {});
        let typed_exclusive: ImplItemFn = parse_quote!(pub fn c(self: &mut Self) {});
        let boxed: ImplItemFn = parse_quote!(pub fn d(self: Box<Self>) {});
        for method in [&exclusive, &owned, &typed_exclusive, &boxed] {
            assert!(!is_shared_self(receiver_of(method)), "{}", method.sig.ident);
        }
    }

    #[test]
    fn test_exclusive_receiver_is_a_compile_error() {
        let mut method: ImplItemFn = parse_quote!(pub fn a(&mut self) {});
        let err = describe_method(&mut method).err().expect("rejected");
        assert!(err.to_string().contains("must take `&self`"));

        let mut private: ImplItemFn = parse_quote!(fn b(&mut self) {});
        assert!(describe_method(&mut private).unwrap().is_none());
    }
}
