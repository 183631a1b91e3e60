use crate::utils::apply_derives;
use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Ident, Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 结构体：事件类型默认取结构体名，可用 `#[domain_event(event_type = "...")]` 覆写
/// - 枚举：事件类型默认 `EnumName.Variant`，变体可用 `#[event(event_type = "...", event_version = N)]` 覆写
/// - `version = N` 指定默认事件版本（默认 1）
/// - 追加派生 Debug, Clone, PartialEq, Serialize, Deserialize，并生成
///   `::uow_domain::domain_event::DomainEvent` 实现（event_type/event_version/payload）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let version_lit = cfg
        .version
        .clone()
        .unwrap_or_else(|| syn::parse_quote! { 1 });

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];

    let (ident, generics, type_body, version_body) = match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            let ty = cfg
                .ty
                .clone()
                .unwrap_or_else(|| syn::LitStr::new(&st.ident.to_string(), st.ident.span()));
            (
                st.ident.clone(),
                st.generics.clone(),
                quote! { #ty },
                quote! { #version_lit },
            )
        }
        Item::Enum(enum_item) => {
            if let Some(ty) = &cfg.ty {
                return syn::Error::new(
                    ty.span(),
                    "'event_type' on an enum is not supported; set it per variant with #[event(event_type = ...)]",
                )
                .to_compile_error()
                .into();
            }
            apply_derives(&mut enum_item.attrs, required);

            let mut variant_types: HashMap<String, syn::LitStr> = HashMap::new();
            let mut variant_versions: HashMap<String, syn::LitInt> = HashMap::new();

            for v in &mut enum_item.variants {
                let mut retained_attrs = Vec::new();
                for attr in v.attrs.iter() {
                    if attr.path().is_ident("event") {
                        match parse_variant_event_attr(attr) {
                            Ok(vc) => {
                                if let Some(lit) = vc.ty {
                                    variant_types.insert(v.ident.to_string(), lit);
                                }
                                if let Some(lit) = vc.version {
                                    variant_versions.insert(v.ident.to_string(), lit);
                                }
                            }
                            Err(err) => return err.to_compile_error().into(),
                        }
                    } else {
                        retained_attrs.push(attr.clone());
                    }
                }
                v.attrs = retained_attrs;
            }

            let enum_name_string = enum_item.ident.to_string();

            // `Self::V { .. }` 对具名、元组与单元变体均适用
            let type_match_arms = enum_item.variants.iter().map(|v| {
                let v_ident = &v.ident;
                let key = v_ident.to_string();
                if let Some(lit) = variant_types.get(&key) {
                    quote! { Self::#v_ident { .. } => #lit }
                } else {
                    let combined = format!("{}.{}", enum_name_string, key);
                    let lit = syn::LitStr::new(&combined, v_ident.span());
                    quote! { Self::#v_ident { .. } => #lit }
                }
            });

            let ver_match_arms = enum_item.variants.iter().map(|v| {
                let v_ident = &v.ident;
                let key = v_ident.to_string();
                if let Some(lit) = variant_versions.get(&key) {
                    quote! { Self::#v_ident { .. } => #lit }
                } else {
                    quote! { Self::#v_ident { .. } => #version_lit }
                }
            });

            let type_arms: Vec<_> = type_match_arms.collect();
            let ver_arms: Vec<_> = ver_match_arms.collect();

            (
                enum_item.ident.clone(),
                enum_item.generics.clone(),
                quote! { match self { #( #type_arms, )* } },
                quote! { match self { #( #ver_arms, )* } },
            )
        }
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on struct or enum types",
            )
            .to_compile_error()
            .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let out = quote! {
        #input

        impl #impl_generics ::uow_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn event_type(&self) -> &str {
                #type_body
            }

            fn event_version(&self) -> usize {
                #version_body
            }

            fn payload(
                &self,
            ) -> ::uow_domain::error::DomainResult<::uow_domain::__private::serde_json::Value> {
                ::uow_domain::domain_event::to_payload(self)
            }
        }
    };

    TokenStream::from(out)
}

// -------- utils & parsing --------

struct VariantEventAttrConfig {
    ty: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> Result<VariantEventAttrConfig> {
    match &attr.meta {
        syn::Meta::List(_) => {
            let mut ty: Option<syn::LitStr> = None;
            let mut version: Option<syn::LitInt> = None;
            let pairs: Punctuated<VariantEventAttrKv, Token![,]> = attr
                .parse_args_with(Punctuated::<VariantEventAttrKv, Token![,]>::parse_terminated)?;

            for kv in pairs {
                match kv.key.to_string().as_str() {
                    "event_type" => {
                        if ty.is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate key 'event_type' in attribute",
                            ));
                        }
                        let lit = match kv.value {
                            Expr::Lit(syn::ExprLit {
                                lit: syn::Lit::Str(lit),
                                ..
                            }) => lit,
                            other => {
                                return Err(syn::Error::new(
                                    other.span(),
                                    "expected string literal for 'event_type'",
                                ));
                            }
                        };
                        ty = Some(lit);
                    }
                    "event_version" => {
                        if version.is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate key 'event_version' in attribute",
                            ));
                        }
                        let lit = match kv.value {
                            Expr::Lit(syn::ExprLit {
                                lit: syn::Lit::Int(lit),
                                ..
                            }) => lit,
                            other => {
                                return Err(syn::Error::new(
                                    other.span(),
                                    "expected integer literal for 'event_version'",
                                ));
                            }
                        };
                        version = Some(lit);
                    }
                    _ => {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "unknown key; expected 'event_type' | 'event_version'",
                        ));
                    }
                }
            }

            Ok(VariantEventAttrConfig { ty, version })
        }
        other => Err(syn::Error::new(other.span(), "expected #[event(...)]")),
    }
}

struct VariantEventAttrKv {
    key: Ident,
    #[allow(dead_code)]
    eq: Token![=],
    value: Expr,
}

impl Parse for VariantEventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        Ok(Self {
            key: input.parse()?,
            eq: input.parse()?,
            value: input.parse()?,
        })
    }
}

// 类型级配置：事件类型名（仅结构体）、默认版本号
struct EventAttrConfig {
    ty: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut ty: Option<syn::LitStr> = None;
        let mut version: Option<syn::LitInt> = None;

        if input.is_empty() {
            return Ok(Self { ty, version });
        }

        let pairs: Punctuated<syn::ExprAssign, Token![,]> =
            Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                syn::Expr::Path(p) if p.path.segments.len() == 1 => {
                    p.path.segments[0].ident.clone()
                }
                other => return Err(syn::Error::new(other.span(), "invalid attribute key")),
            };
            match key_ident.to_string().as_str() {
                "event_type" => {
                    if ty.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'event_type' in attribute",
                        ));
                    }
                    let lit: syn::LitStr = syn::parse2(assign.right.to_token_stream())?;
                    ty = Some(lit);
                }
                "version" => {
                    if version.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'version' in attribute",
                        ));
                    }
                    let lit: syn::LitInt = syn::parse2(assign.right.to_token_stream())?;
                    version = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'event_type' | 'version'",
                    ));
                }
            }
        }

        Ok(Self { ty, version })
    }
}
