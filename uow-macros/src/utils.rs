use quote::ToTokens;
use syn::{Attribute, Field, FieldsNamed, Token, Type, punctuated::Punctuated};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
            ) {
                for p in list.into_iter() {
                    existing.push(p);
                }
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
pub(crate) fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let mut final_list: Vec<syn::Path> = Vec::new();
    let mut push_unique = |p: syn::Path| {
        let key = derive_key(&p);
        if seen.insert(key) {
            final_list.push(p);
        }
    };
    for p in required {
        push_unique(p);
    }
    for p in existing {
        push_unique(p);
    }
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
pub(crate) fn derive_key(p: &syn::Path) -> String {
    if let Some(last) = p.segments.last() {
        let last_ident = last.ident.to_string();
        match last_ident.as_str() {
            "Serialize" | "Deserialize" => format!("serde::{}", last_ident),
            _ => last_ident,
        }
    } else {
        p.to_token_stream().to_string()
    }
}

// 直接在 attrs 上应用默认派生合并
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

// 是否已派生 serde（Serialize 或 Deserialize 任一）
pub(crate) fn derives_serde(attrs: &[Attribute]) -> bool {
    let (_, existing) = split_derives(attrs);
    existing.iter().any(|p| derive_key(p).starts_with("serde::"))
}

/// 确保具名字段结构体包含所需字段
/// - required: (字段名, 字段类型) 列表，按给定顺序放在最前；
///   若字段已存在则复用原定义（保留其属性），否则按给定类型新增。
/// - 其余字段保持原有相对顺序。
pub(crate) fn ensure_required_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required.iter() {
        if let Some(existing) = old_named
            .iter()
            .find(|f| f.ident.as_ref().map(|i| i == *name).unwrap_or(false))
        {
            new_named.push(existing.clone());
        } else {
            let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
            let field: Field = syn::parse_quote! { #ident: #ty };
            new_named.push(field);
        }
    }

    for f in old_named.into_iter() {
        let is_required = f
            .ident
            .as_ref()
            .map(|i| required.iter().any(|(n, _)| i == n))
            .unwrap_or(false);
        if !is_required {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}

/// 为指定字段追加属性（若字段存在）
pub(crate) fn add_field_attr(fields_named: &mut FieldsNamed, name: &str, attr: Attribute) {
    if let Some(field) = fields_named
        .named
        .iter_mut()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
    {
        field.attrs.push(attr);
    }
}
