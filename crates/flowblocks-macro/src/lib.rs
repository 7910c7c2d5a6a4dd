//! # Flowblocks Procedural Macros
//!
//! Code generation for declaring blocks, lifecycle hooks and the app
//! configuration surface of a connector.
//!
//! ## Main Macros
//!
//! - `#[block]` - Attribute macro for block handlers
//! - `#[init]` - Attribute macro for initialization functions
//! - `#[shutdown]` - Attribute macro for shutdown/cleanup functions
//! - `define_app_config!` - Declares the settings a connector reads from the host
//!
//! ## Block Definition
//!
//! Blocks carry their metadata in structured doc comments:
//!
//! ```ignore
//! /// # Create post (ID: createPost)
//! ///
//! /// Create a new post (feature request, bug report, etc.) in Featurebase.
//! ///
//! /// ## Category
//! /// - Posts
//! #[block]
//! async fn create_post(ctx: Context, input: CreatePostInput) -> Result<CreatePostOutput> {
//!     // ...
//! }
//! ```
//!
//! The macro generates:
//! - A wrapper translating JSON in and out of the handler
//! - Schema generation for input/output types
//! - Registration with the global block inventory
//!
//! ## App Configuration
//!
//! ```ignore
//! define_app_config!(FeaturebaseConfig("featurebase") {
//!     /// Featurebase API key
//!     #[sensitive]
//!     api_key: String,
//!     /// Base URL override
//!     #[optional]
//!     base_url: Option<String>,
//! });
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Error, Expr, FnArg, Ident, ItemFn, Lit, Meta, Result, Type, parse_macro_input,
    spanned::Spanned,
};

/// Metadata extracted from a block's doc comments.
struct DocCommentMetadata {
    /// Block description (content after the H1 heading)
    description: Option<String>,
    /// Block type id (from the H1 heading suffix `(ID: ...)`)
    id: Option<String>,
    /// Display name (from H1 heading)
    name: Option<String>,
    /// Catalog category (first item of the `## Category` section)
    category: Option<String>,
}

/// Extracts block metadata from doc comments.
///
/// Parses:
/// - `# Block Name (ID: blockTypeId)` - H1 heading with optional ID override
/// - Description text following H1
/// - `## Category` section with a single list item
///
/// A second H1 (for example `# Errors`) ends the metadata section.
/// Returns `None` if no doc comments are present.
fn extract_doc_metadata(attrs: &[Attribute]) -> Option<DocCommentMetadata> {
    let doc_lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| {
            if let Meta::NameValue(nv) = &attr.meta
                && let Expr::Lit(lit) = &nv.value
                && let Lit::Str(s) = &lit.lit
            {
                return Some(s.value().trim().to_string());
            }
            None
        })
        .collect();

    if doc_lines.is_empty() {
        return None;
    }

    let mut metadata = DocCommentMetadata {
        description: None,
        id: None,
        name: None,
        category: None,
    };

    let mut current_section: Option<String> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut h1_parsed = false;

    for line in doc_lines {
        if let Some(rest) = line.strip_prefix("# ") {
            if h1_parsed {
                break;
            }

            let h1_content = rest.trim();
            h1_parsed = true;

            if let Some(pos) = h1_content.find("(ID:") {
                let id_part = h1_content[pos + 4..]
                    .trim()
                    .strip_suffix(')')
                    .unwrap_or("")
                    .trim()
                    .to_string();

                metadata.name = Some(h1_content[..pos].trim().to_string());
                if !id_part.is_empty() {
                    metadata.id = Some(id_part);
                }
            } else {
                metadata.name = Some(h1_content.to_string());
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("## ") {
            flush_paragraph(&mut paragraph, &mut paragraphs);
            current_section = Some(rest.trim().to_string());
            continue;
        }

        if let Some(rest) = line.strip_prefix('-')
            && current_section.as_deref() == Some("Category")
        {
            if metadata.category.is_none() {
                metadata.category = Some(rest.trim().to_string());
            }
            continue;
        }

        if h1_parsed && current_section.is_none() {
            if line.is_empty() {
                flush_paragraph(&mut paragraph, &mut paragraphs);
            } else {
                paragraph.push(line);
            }
        }
    }
    flush_paragraph(&mut paragraph, &mut paragraphs);

    metadata.description = if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    };

    Some(metadata)
}

/// Wrapped doc lines of one paragraph are joined with spaces.
fn flush_paragraph(lines: &mut Vec<String>, paragraphs: &mut Vec<String>) {
    if !lines.is_empty() {
        paragraphs.push(lines.join(" "));
        lines.clear();
    }
}

/// Attribute macro for defining block handler functions.
///
/// The annotated function must:
/// - Be `async`
/// - Take exactly 2 parameters: `(ctx: Context, input: Input)`
/// - Return `Result<Output, Error>`
///
/// # Errors
///
/// Returns a compile error if:
/// - Attributes are provided (use doc comments instead)
/// - Doc comments are missing the name, description or category
/// - Function signature requirements aren't met
#[proc_macro_attribute]
pub fn block(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return Error::new(
            proc_macro2::Span::call_site(),
            "#[block] does not accept attributes. Use doc comments instead:\n/// # Block \
             Name (ID: blockId)\n/// Description here.\n/// ## Category\n/// - Posts\n#[block]\n\
             async fn my_block(...)",
        )
        .to_compile_error()
        .into();
    }

    let func = parse_macro_input!(item as ItemFn);

    match expand_block(&func) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Expands a `#[block]` attribute into the handler, its JSON wrapper and
/// the inventory submission.
///
/// # Errors
///
/// Returns an error if:
/// - Doc metadata is missing required fields
/// - Function is not async
/// - Function doesn't have exactly 2 parameters
/// - Return type is not `Result<T, E>`
fn expand_block(func: &ItemFn) -> Result<proc_macro2::TokenStream> {
    let func_name = &func.sig.ident;

    let metadata = extract_doc_metadata(&func.attrs).ok_or_else(|| {
        Error::new(
            func.sig.ident.span(),
            "block must have doc comments used for metadata",
        )
    })?;

    let block_id = metadata.id.unwrap_or_else(|| func_name.to_string());

    let display_name = metadata.name.ok_or_else(|| {
        Error::new(
            func.sig.ident.span(),
            "missing block name in doc comments (must be the first H1 heading)",
        )
    })?;

    let description = metadata.description.ok_or_else(|| {
        Error::new(
            func.sig.ident.span(),
            "missing block description in doc comments (must follow H1 heading)",
        )
    })?;

    let category = metadata.category.ok_or_else(|| {
        Error::new(
            func.sig.ident.span(),
            "missing block category in doc comments (add a `## Category` list)",
        )
    })?;

    let sig = &func.sig;

    if sig.asyncness.is_none() {
        return Err(Error::new(sig.fn_token.span, "block handler must be async"));
    }

    let args: Vec<_> = sig.inputs.iter().collect();
    if args.len() != 2 {
        return Err(Error::new(
            sig.inputs.span(),
            "block handler must have exactly 2 arguments: (ctx: Context, input: Input)",
        ));
    }

    let input_type = match &args[1] {
        FnArg::Typed(pat_type) => &pat_type.ty,
        FnArg::Receiver(_) => {
            return Err(Error::new(
                args[1].span(),
                "expected typed argument for input",
            ));
        }
    };

    let output_type = match &sig.output {
        syn::ReturnType::Type(_, ty) => extract_result_ok_type(ty)?,
        syn::ReturnType::Default => {
            return Err(Error::new(
                sig.output.span(),
                "block handler must return Result<Output, ...>",
            ));
        }
    };

    let wrapper_ident = format_ident!("__flowblocks_wrapper_{}", func_name);

    let expanded = quote! {
        #func

        #[doc(hidden)]
        pub fn #wrapper_ident(
            ctx: ::flowblocks::Context,
            input: ::flowblocks::__private::serde_json::Value,
        ) -> ::std::pin::Pin<::std::boxed::Box<dyn ::std::future::Future<Output = ::flowblocks::__private::anyhow::Result<::flowblocks::__private::serde_json::Value>> + ::std::marker::Send + 'static>> {
            ::std::boxed::Box::pin(async move {
                let input: #input_type = ::flowblocks::__private::serde_json::from_value(input)?;
                let output = #func_name(ctx, input).await?;
                Ok(::flowblocks::__private::serde_json::to_value(&output)?)
            })
        }

        ::flowblocks::__private::inventory::submit! {
            ::flowblocks::__private::BlockEntry {
                id: #block_id,
                name: #display_name,
                description: #description,
                category: #category,
                input_schema_fn: || {
                    ::flowblocks::__private::schemars::schema_for!(#input_type).to_value()
                },
                output_schema_fn: || {
                    ::flowblocks::__private::schemars::schema_for!(#output_type).to_value()
                },
                handler: #wrapper_ident,
                __sealed: ::flowblocks::__private::sealed(),
            }
        }
    };

    Ok(expanded)
}

/// Attribute macro for defining initialization functions.
///
/// Annotates an async function with no parameters that runs once before the
/// host starts dispatching to blocks.
#[proc_macro_attribute]
pub fn init(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    match expand_init(&func) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// # Errors
///
/// Returns an error if the function is not async or takes parameters.
fn expand_init(func: &ItemFn) -> Result<proc_macro2::TokenStream> {
    let func_name = &func.sig.ident;
    let func_name_str = func_name.to_string();
    let sig = &func.sig;

    if sig.asyncness.is_none() {
        return Err(Error::new(sig.fn_token.span, "init function must be async"));
    }

    if !sig.inputs.is_empty() {
        return Err(Error::new(
            sig.inputs.span(),
            "init function must have no parameters",
        ));
    }

    let wrapper_ident = format_ident!("__flowblocks_init_wrapper_{}", func_name);

    let expanded = quote! {
        #func

        #[doc(hidden)]
        pub fn #wrapper_ident(
        ) -> ::std::pin::Pin<::std::boxed::Box<dyn ::std::future::Future<Output = ::flowblocks::__private::anyhow::Result<()>> + ::std::marker::Send + 'static>> {
            ::std::boxed::Box::pin(async move {
                #func_name().await
            })
        }

        ::flowblocks::__private::inventory::submit! {
            ::flowblocks::__private::InitEntry {
                name: #func_name_str,
                handler: #wrapper_ident,
                __sealed: ::flowblocks::__private::sealed(),
            }
        }
    };

    Ok(expanded)
}

/// Attribute macro for defining shutdown/cleanup functions.
///
/// The function must be synchronous and take no parameters.
#[proc_macro_attribute]
pub fn shutdown(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);

    match expand_shutdown(&func) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_shutdown(func: &ItemFn) -> Result<proc_macro2::TokenStream> {
    let func_name = &func.sig.ident;
    let func_name_str = func_name.to_string();
    let sig = &func.sig;

    if sig.asyncness.is_some() {
        return Err(Error::new(
            sig.fn_token.span,
            "shutdown function must be synchronous (not async)",
        ));
    }

    if !sig.inputs.is_empty() {
        return Err(Error::new(
            sig.inputs.span(),
            "shutdown function must have no parameters",
        ));
    }

    let expanded = quote! {
        #func

        ::flowblocks::__private::inventory::submit! {
            ::flowblocks::__private::ShutdownEntry {
                name: #func_name_str,
                handler: #func_name,
                __sealed: ::flowblocks::__private::sealed(),
            }
        }
    };

    Ok(expanded)
}

/// Extracts the `T` from a `Result<T, E>` type.
///
/// # Errors
///
/// Returns an error if the type is not a `Result` with a leading type
/// argument.
fn extract_result_ok_type(ty: &Type) -> Result<&Type> {
    let Type::Path(type_path) = ty else {
        return Err(Error::new(ty.span(), "expected Result<T, E> return type"));
    };

    let segment = type_path
        .path
        .segments
        .last()
        .ok_or_else(|| Error::new(ty.span(), "expected Result<T, E> return type"))?;

    if segment.ident != "Result" {
        return Err(Error::new(ty.span(), "expected Result<T, E> return type"));
    }

    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return Err(Error::new(
            ty.span(),
            "expected Result<T, E> with type arguments",
        ));
    };

    match args.args.first() {
        Some(syn::GenericArgument::Type(t)) => Ok(t),
        Some(_) => Err(Error::new(ty.span(), "expected type argument")),
        None => Err(Error::new(ty.span(), "Result must have type arguments")),
    }
}

/// Declares the app configuration a connector reads from the host.
///
/// Syntax:
/// ```ignore
/// define_app_config!(StructName("app_name") {
///     /// Field description
///     #[sensitive]
///     field_name: Type,
///     /// Optional field description
///     #[optional]
///     optional_field: Option<Type>,
/// });
/// ```
///
/// Generates a struct deserialized from `camelCase` keys, a `get(ctx)`
/// accessor and an entry in the app config inventory.
#[proc_macro]
pub fn define_app_config(input: TokenStream) -> TokenStream {
    let def = parse_macro_input!(input as AppConfigDef);
    expand_app_config(&def).into()
}

struct AppConfigDef {
    struct_name: Ident,
    app_name: String,
    fields: Vec<AppConfigField>,
}

struct AppConfigField {
    name: Ident,
    ty: Type,
    optional: bool,
    sensitive: bool,
    description: Option<String>,
}

impl syn::parse::Parse for AppConfigDef {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        // StructName("app_name") { fields... }
        let struct_name: Ident = input.parse()?;

        let content;
        syn::parenthesized!(content in input);
        let app_name: syn::LitStr = content.parse()?;

        let fields_content;
        syn::braced!(fields_content in input);

        let mut fields = Vec::new();
        while !fields_content.is_empty() {
            let attrs: Vec<Attribute> = fields_content.call(Attribute::parse_outer)?;
            let mut optional = false;
            let mut sensitive = false;
            let mut description: Option<String> = None;

            for attr in attrs {
                if attr.path().is_ident("optional") {
                    optional = true;
                } else if attr.path().is_ident("sensitive") {
                    sensitive = true;
                } else if attr.path().is_ident("doc")
                    && let Meta::NameValue(nv) = &attr.meta
                    && let Expr::Lit(lit) = &nv.value
                    && let Lit::Str(s) = &lit.lit
                {
                    let line = s.value().trim().to_string();
                    description = Some(match description {
                        Some(existing) => format!("{existing} {line}"),
                        None => line,
                    });
                } else {
                    return Err(Error::new(
                        attr.span(),
                        "unsupported attribute (expected #[optional] or #[sensitive])",
                    ));
                }
            }

            let name: Ident = fields_content.parse()?;
            fields_content.parse::<syn::Token![:]>()?;
            let ty: Type = fields_content.parse()?;

            if fields_content.peek(syn::Token![,]) {
                fields_content.parse::<syn::Token![,]>()?;
            }

            fields.push(AppConfigField {
                name,
                ty,
                optional,
                sensitive,
                description,
            });
        }

        Ok(Self {
            struct_name,
            app_name: app_name.value(),
            fields,
        })
    }
}

/// Converts a `snake_case` field name into the `camelCase` key the host uses.
fn camel_case_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.trim_start_matches("r#").chars() {
        if ch == '_' {
            upper_next = !key.is_empty();
        } else if upper_next {
            key.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            key.push(ch);
        }
    }
    key
}

fn expand_app_config(def: &AppConfigDef) -> proc_macro2::TokenStream {
    let struct_name = &def.struct_name;
    let app_name = &def.app_name;

    let field_defs: Vec<_> = def
        .fields
        .iter()
        .map(|f| {
            let name = &f.name;
            let ty = &f.ty;
            let doc = f.description.as_deref().map(|d| quote!(#[doc = #d]));
            quote! {
                #doc
                pub #name: #ty
            }
        })
        .collect();

    let field_schema_entries: Vec<_> = def
        .fields
        .iter()
        .map(|f| {
            let key = camel_case_key(&f.name.to_string());
            let required = !f.optional;
            let sensitive = f.sensitive;
            let desc = f.description.as_deref().unwrap_or("");
            quote! {
                (#key, ::flowblocks::__private::AppConfigFieldSchema {
                    description: #desc,
                    required: #required,
                    sensitive: #sensitive,
                })
            }
        })
        .collect();

    let redacted_fields: Vec<_> = def
        .fields
        .iter()
        .map(|f| {
            let name = &f.name;
            let name_str = name.to_string();
            if f.sensitive {
                quote! { .field(#name_str, &"<redacted>") }
            } else {
                quote! { .field(#name_str, &self.#name) }
            }
        })
        .collect();

    let struct_name_str = struct_name.to_string();

    quote! {
        #[derive(Clone, ::flowblocks::__private::serde::Deserialize)]
        #[serde(crate = "::flowblocks::__private::serde", rename_all = "camelCase")]
        pub struct #struct_name {
            #(#field_defs,)*
        }

        impl #struct_name {
            /// Reads this app configuration from the invocation context.
            ///
            /// # Errors
            ///
            /// Returns an error if no app configuration was supplied or a
            /// required key is missing.
            pub fn get(ctx: &::flowblocks::Context) -> ::std::result::Result<Self, ::flowblocks::AppConfigError> {
                ctx.app_config()
            }
        }

        impl ::std::fmt::Debug for #struct_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(#struct_name_str)
                    #(#redacted_fields)*
                    .finish()
            }
        }

        ::flowblocks::__private::inventory::submit! {
            ::flowblocks::__private::AppConfigEntry {
                name: #app_name,
                fields: &[#(#field_schema_entries,)*],
                __sealed: ::flowblocks::__private::sealed(),
            }
        }
    }
}
