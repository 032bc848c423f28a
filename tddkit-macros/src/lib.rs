//! Procedural macros for tddkit
//!
//! This crate provides the `#[tddkit::test]` attribute, which runs a test
//! body against a fresh `TestContext` and fails the test with every recorded
//! issue, and `#[derive(CaseDebug)]`, which prints enum cases in a short
//! `.Case(value)` form.
//!
//! # Example
//!
//! ```rust,ignore
//! use tddkit::TestContext;
//!
//! #[tddkit::test]
//! fn collects_every_issue(cx: TestContext) {
//!     cx.assert_contains_equal(&["b", "a"], &["a", "b"], "");
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, parse_quote, Data, DeriveInput, Fields, FnArg, GenericParam, Ident, ItemFn,
    Lit, Token, Type,
};

/// Configuration options for the test macro.
#[derive(Default)]
struct TestConfig {
    /// Which async runtime to use ("tokio" or "async-std")
    runtime: Option<String>,
    /// Flavor for tokio runtime ("current_thread" or "multi_thread")
    flavor: Option<String>,
    /// Panic on the first recorded issue
    fail_fast: bool,
}

impl Parse for TestConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = TestConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "runtime" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        config.runtime = Some(s.value());
                    }
                }
                "flavor" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        config.flavor = Some(s.value());
                    }
                }
                "fail_fast" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Bool(b) = lit {
                        config.fail_fast = b.value();
                    }
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Determines if a function parameter is requesting a TestContext.
fn is_context_param(arg: &FnArg) -> bool {
    if let FnArg::Typed(pat_type) = arg {
        if let Type::Path(type_path) = &*pat_type.ty {
            if let Some(segment) = type_path.path.segments.last() {
                return segment.ident == "TestContext";
            }
        }
    }
    false
}

/// Test attribute that runs the body against a fresh `TestContext`.
///
/// After the body returns, teardown blocks run and the test fails with every
/// issue recorded during the test.
///
/// # Basic Usage
///
/// ```rust,ignore
/// #[tddkit::test]
/// fn test_basic() {
///     assert!(true);
/// }
/// ```
///
/// # With TestContext Injection
///
/// Add a `cx: TestContext` parameter to receive the context, named after the
/// test function:
///
/// ```rust,ignore
/// use tddkit::TestContext;
///
/// #[tddkit::test]
/// async fn test_with_context(cx: TestContext) {
///     let error = cx.capture_error_async(load(), "").await;
///     cx.assert_some_cast_equal(error.as_ref(), &expected, "");
/// }
/// ```
///
/// # Configuration Options
///
/// - `runtime = "tokio"` or `runtime = "async-std"` - Select the async runtime
/// - `flavor = "multi_thread"` - Tokio runtime flavor
/// - `fail_fast = true` - Panic on the first recorded issue
///
/// Return types such as `Result<(), E>` are preserved.
///
/// ```rust,ignore
/// #[tddkit::test(flavor = "multi_thread", fail_fast = true)]
/// async fn test_fail_fast(cx: TestContext) -> Result<(), std::io::Error> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as TestConfig);
    let input = parse_macro_input!(item as ItemFn);

    expand_test(config, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_test(config: TestConfig, input: ItemFn) -> syn::Result<TokenStream2> {
    let name = &input.sig.ident;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let output = &input.sig.output;
    let is_async = input.sig.asyncness.is_some();

    if !input.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.sig.generics,
            "test function must not be generic",
        ));
    }

    let takes_context = match input.sig.inputs.len() {
        0 => false,
        1 if input.sig.inputs.iter().all(is_context_param) => true,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.sig.inputs,
                "test function may only take a single `TestContext` parameter",
            ));
        }
    };

    if !is_async && config.runtime.is_some() {
        return Err(syn::Error::new_spanned(
            &input.sig,
            "`runtime` only applies to async test functions",
        ));
    }

    // The annotated function becomes an inner item so its return type and
    // parameter pattern are kept as written.
    let inner_name = format_ident!("__tddkit_{}", name);
    let mut inner = input.clone();
    inner.sig.ident = inner_name.clone();
    inner.attrs.clear();
    inner.vis = syn::Visibility::Inherited;

    let context_config = if config.fail_fast {
        quote! { ::tddkit::ContextConfig::from_env().fail_fast() }
    } else {
        quote! { ::tddkit::ContextConfig::from_env() }
    };

    let call_args = if takes_context {
        quote! { __tddkit_cx.clone() }
    } else {
        quote! {}
    };
    let call = if is_async {
        quote! { #inner_name(#call_args).await }
    } else {
        quote! { #inner_name(#call_args) }
    };

    let body = quote! {
        #inner
        ::tddkit::logging::init_test_logging();
        let __tddkit_cx = ::tddkit::TestContext::with_config(
            ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name)),
            #context_config,
        );
        let __tddkit_result = #call;
        __tddkit_cx.finish_or_panic();
        __tddkit_result
    };

    if !is_async {
        return Ok(quote! {
            #[::core::prelude::v1::test]
            #(#attrs)*
            #vis fn #name() #output {
                #body
            }
        });
    }

    let runtime = config.runtime.as_deref().unwrap_or("tokio");
    let flavor = config.flavor.as_deref().unwrap_or("current_thread");

    let runtime_attr = match runtime {
        "tokio" => match flavor {
            "multi_thread" => quote! { #[::tokio::test(flavor = "multi_thread")] },
            "current_thread" => quote! { #[::tokio::test] },
            _ => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("unsupported flavor: {flavor}. Use \"current_thread\" or \"multi_thread\""),
                ));
            }
        },
        "async-std" => quote! { #[::async_std::test] },
        _ => {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("unsupported runtime: {runtime}. Use \"tokio\" or \"async-std\""),
            ));
        }
    };

    Ok(quote! {
        #runtime_attr
        #(#attrs)*
        #vis async fn #name() #output {
            #body
        }
    })
}

/// Derive a `Debug` implementation that prints enum cases by name.
///
/// - unit variants print as `.Case`
/// - tuple variants print as `.Case(a, b)`
/// - struct variants print as `.Case(name: value)`
/// - structs print as their bare type name, without fields
///
/// Field values use their own `Debug` implementation.
///
/// ```rust,ignore
/// #[derive(tddkit::CaseDebug)]
/// enum Message {
///     GetUsername,
///     SetAge(u8),
/// }
///
/// assert_eq!(format!("{:?}", Message::SetAge(3)), ".SetAge(3)");
/// ```
#[proc_macro_derive(CaseDebug)]
pub fn derive_case_debug(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    expand_case_debug(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_case_debug(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = input.ident.clone();

    let body = match &input.data {
        Data::Struct(_) => {
            let label = name.to_string();
            quote! { f.write_str(#label) }
        }
        Data::Enum(data) => {
            let arms = data.variants.iter().map(|variant| {
                let ident = &variant.ident;
                let label = format!(".{ident}");
                match &variant.fields {
                    Fields::Unit => quote! {
                        Self::#ident => f.write_str(#label),
                    },
                    Fields::Unnamed(fields) => {
                        let bindings: Vec<_> = (0..fields.unnamed.len())
                            .map(|index| format_ident!("__field{}", index))
                            .collect();
                        let writes = bindings.iter().enumerate().map(|(index, binding)| {
                            let separator = if index == 0 { "" } else { ", " };
                            quote! {
                                f.write_str(#separator)?;
                                ::core::fmt::Debug::fmt(#binding, f)?;
                            }
                        });
                        quote! {
                            Self::#ident(#(#bindings),*) => {
                                f.write_str(#label)?;
                                f.write_str("(")?;
                                #(#writes)*
                                f.write_str(")")
                            }
                        }
                    }
                    Fields::Named(fields) => {
                        let bindings: Vec<_> = fields
                            .named
                            .iter()
                            .filter_map(|field| field.ident.clone())
                            .collect();
                        let writes = bindings.iter().enumerate().map(|(index, binding)| {
                            let separator = if index == 0 { "" } else { ", " };
                            let field_label = format!("{separator}{binding}: ");
                            quote! {
                                f.write_str(#field_label)?;
                                ::core::fmt::Debug::fmt(#binding, f)?;
                            }
                        });
                        quote! {
                            Self::#ident { #(#bindings),* } => {
                                f.write_str(#label)?;
                                f.write_str("(")?;
                                #(#writes)*
                                f.write_str(")")
                            }
                        }
                    }
                }
            });

            let type_params: Vec<_> = input
                .generics
                .params
                .iter()
                .filter_map(|param| match param {
                    GenericParam::Type(ty) => Some(ty.ident.clone()),
                    _ => None,
                })
                .collect();
            let where_clause = input.generics.make_where_clause();
            for param in type_params {
                where_clause
                    .predicates
                    .push(parse_quote! { #param: ::core::fmt::Debug });
            }

            if data.variants.is_empty() {
                quote! { match *self {} }
            } else {
                quote! {
                    match self {
                        #(#arms)*
                    }
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "CaseDebug cannot be derived for unions",
            ));
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::core::fmt::Debug for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                #body
            }
        }
    })
}
