use crate::utils::{add_field_attr, apply_derives, derives_serde, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Item, ItemStruct, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityKind {
    Entity,
    AggregateRoot,
}

/// #[entity] / #[aggregate_root] 宏实现
/// - 追加字段 `id: Uuid`（若缺失）并置于字段最前
/// - `auditable` 时追加 `created_at_utc` / `modified_at_utc` 并实现 `Auditable`
/// - 聚合根追加 `domain_events: DomainEvents` 并实现 `AggregateRoot`
/// - 实现 `::uow_domain::entity::Entity`（TYPE/id 以及能力钩子）
/// - 支持参数：`#[entity(auditable, type_name = "orders")]`；`type_name` 默认结构体名
pub(crate) fn expand(attr: TokenStream, item: TokenStream, kind: EntityKind) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let with_serde = derives_serde(&st.attrs);

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let had_events_field = fields_named
        .named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == "domain_events").unwrap_or(false));

    let uuid_ty: Type = syn::parse_quote! { ::uow_domain::__private::uuid::Uuid };
    let ts_ty: Type = syn::parse_quote! {
        ::std::option::Option<
            ::uow_domain::__private::chrono::DateTime<::uow_domain::__private::chrono::Utc>
        >
    };
    let events_ty: Type = syn::parse_quote! { ::uow_domain::domain_event::DomainEvents };

    let mut required: Vec<(&str, &Type)> = vec![("id", &uuid_ty)];
    if cfg.auditable {
        required.push(("created_at_utc", &ts_ty));
        required.push(("modified_at_utc", &ts_ty));
    }
    if kind == EntityKind::AggregateRoot {
        required.push(("domain_events", &events_ty));
    }
    ensure_required_fields(fields_named, &required);

    // 事件缓冲不参与序列化
    if kind == EntityKind::AggregateRoot && with_serde && !had_events_field {
        add_field_attr(fields_named, "domain_events", syn::parse_quote!(#[serde(skip)]));
    }

    apply_derives(
        &mut st.attrs,
        vec![syn::parse_quote!(Debug), syn::parse_quote!(Clone)],
    );

    let out_struct = ItemStruct { ..st };

    let ident = &out_struct.ident;
    let type_name = cfg
        .type_name
        .unwrap_or_else(|| syn::LitStr::new(&ident.to_string(), ident.span()));
    let generics = out_struct.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let auditable_hook = cfg.auditable.then(|| {
        quote! {
            fn as_auditable_mut(
                &mut self,
            ) -> ::std::option::Option<&mut dyn ::uow_domain::auditable::Auditable> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let events_hook = (kind == EntityKind::AggregateRoot).then(|| {
        quote! {
            fn event_buffer_mut(
                &mut self,
            ) -> ::std::option::Option<&mut ::uow_domain::domain_event::DomainEvents> {
                ::std::option::Option::Some(&mut self.domain_events)
            }
        }
    });

    let auditable_impl = cfg.auditable.then(|| {
        quote! {
            impl #impl_generics ::uow_domain::auditable::Auditable for #ident #ty_generics #where_clause {
                fn set_created_at(
                    &mut self,
                    at: ::uow_domain::__private::chrono::DateTime<::uow_domain::__private::chrono::Utc>,
                ) {
                    self.created_at_utc = ::std::option::Option::Some(at);
                }

                fn set_modified_at(
                    &mut self,
                    at: ::uow_domain::__private::chrono::DateTime<::uow_domain::__private::chrono::Utc>,
                ) {
                    self.modified_at_utc = ::std::option::Option::Some(at);
                }

                fn created_at(
                    &self,
                ) -> ::std::option::Option<
                    ::uow_domain::__private::chrono::DateTime<::uow_domain::__private::chrono::Utc>,
                > {
                    self.created_at_utc
                }

                fn modified_at(
                    &self,
                ) -> ::std::option::Option<
                    ::uow_domain::__private::chrono::DateTime<::uow_domain::__private::chrono::Utc>,
                > {
                    self.modified_at_utc
                }
            }
        }
    });

    let aggregate_impl = (kind == EntityKind::AggregateRoot).then(|| {
        quote! {
            impl #impl_generics ::uow_domain::aggregate_root::AggregateRoot for #ident #ty_generics #where_clause {
                fn domain_events(&self) -> &::uow_domain::domain_event::DomainEvents {
                    &self.domain_events
                }

                fn domain_events_mut(&mut self) -> &mut ::uow_domain::domain_event::DomainEvents {
                    &mut self.domain_events
                }
            }
        }
    });

    let expanded = quote! {
        #out_struct

        impl #impl_generics ::uow_domain::entity::Entity for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #type_name;

            fn id(&self) -> ::uow_domain::__private::uuid::Uuid { self.id }

            #auditable_hook

            #events_hook
        }

        #auditable_impl

        #aggregate_impl
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct EntityAttrConfig {
    auditable: bool,
    type_name: Option<syn::LitStr>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut auditable = false;
        let mut type_name: Option<syn::LitStr> = None;

        if input.is_empty() {
            return Ok(Self {
                auditable,
                type_name,
            });
        }

        let elems: Punctuated<EntityAttrElem, Token![,]> =
            Punctuated::<EntityAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            match elem {
                EntityAttrElem::Auditable(span) => {
                    if auditable {
                        return Err(syn::Error::new(span, "duplicate key 'auditable' in attribute"));
                    }
                    auditable = true;
                }
                EntityAttrElem::TypeName(lit) => {
                    if type_name.is_some() {
                        return Err(syn::Error::new(
                            lit.span(),
                            "duplicate key 'type_name' in attribute",
                        ));
                    }
                    type_name = Some(lit);
                }
            }
        }

        Ok(Self {
            auditable,
            type_name,
        })
    }
}

enum EntityAttrElem {
    Auditable(proc_macro2::Span),
    TypeName(syn::LitStr),
}

impl Parse for EntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "auditable" {
            Ok(EntityAttrElem::Auditable(key.span()))
        } else if key == "type_name" {
            let _eq: Token![=] = input.parse()?;
            let lit: syn::LitStr = input.parse()?;
            Ok(EntityAttrElem::TypeName(lit))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'auditable' or 'type_name'",
            ))
        }
    }
}
