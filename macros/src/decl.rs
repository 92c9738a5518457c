use convert_case::{Case, Casing};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{ext::IdentExt, parse::Parse, punctuated::Punctuated, *};

/// The widest union whose trait resolution fits the default recursion limit.
const MAX_ALTERNATIVES: usize = 32;

/// One declared alternative.
struct Alt {
    attrs: Vec<Attribute>,
    name: Ident,
    variant: Ident,
    ty: Type,
}

pub struct UnionDecl {
    attrs: Vec<Attribute>,
    vis: Visibility,
    ident: Ident,
    generics: Generics,
    alts: Vec<Alt>,
    debug: bool,
}

/// Splits `Debug` out of the derives, rejecting `Copy`.
fn forward_attrs(attrs: Vec<Attribute>) -> Result<(Vec<Attribute>, bool)> {
    let mut debug = false;
    let mut forwarded = Vec::with_capacity(attrs.len());
    for attr in attrs {
        if !attr.path().is_ident("derive") {
            forwarded.push(attr);
            continue;
        }

        let paths = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
        let mut kept = Punctuated::<Path, Token![,]>::new();
        for path in paths {
            let last = path.segments.last().map(|s| s.ident.to_string());
            match last.as_deref() {
                Some("Copy") => {
                    return Err(Error::new_spanned(
                        path,
                        "tagged unions cannot be `Copy`; derive `Clone` instead",
                    ))
                }
                Some("Debug") => debug = true,
                _ => kept.push(path),
            }
        }
        if !kept.is_empty() {
            forwarded.push(parse_quote!(#[derive(#kept)]));
        }
    }
    Ok((forwarded, debug))
}

fn tag_variant(name: &Ident) -> Result<Ident> {
    let pascal = name.unraw().to_string().to_case(Case::Pascal);
    let mut variant: Ident = parse_str(&pascal).map_err(|_| {
        Error::new_spanned(
            name,
            format_args!("alternative `{name}` has no usable tag name"),
        )
    })?;
    variant.set_span(name.span());
    Ok(variant)
}

impl Parse for UnionDecl {
    fn parse(input: parse::ParseStream<'_>) -> Result<Self> {
        let ItemUnion {
            attrs,
            vis,
            ident,
            generics,
            fields,
            ..
        } = input.parse()?;

        let (attrs, debug) = forward_attrs(attrs)?;

        if fields.named.is_empty() {
            return Err(Error::new_spanned(
                &ident,
                "a tagged union needs at least one alternative",
            ));
        }
        if fields.named.len() > MAX_ALTERNATIVES {
            return Err(Error::new_spanned(
                &ident,
                format_args!("a tagged union holds at most {MAX_ALTERNATIVES} alternatives"),
            ));
        }

        let mut alts: Vec<Alt> = Vec::with_capacity(fields.named.len());
        for field in fields.named {
            let Field {
                attrs, vis, ident: name, ty, ..
            } = field;

            let name = name.ok_or_else(|| Error::new_spanned(&ty, "alternatives must be named"))?;
            if !matches!(vis, Visibility::Inherited) {
                return Err(Error::new_spanned(
                    vis,
                    "alternatives take the visibility of the union",
                ));
            }

            let variant = tag_variant(&name)?;
            if let Some(prev) = alts.iter().find(|a| a.name.unraw() == name.unraw()) {
                return Err(Error::new_spanned(
                    &name,
                    format_args!("duplicate alternative `{}`", prev.name.unraw()),
                ));
            }
            if let Some(prev) = alts.iter().find(|a| a.variant == variant) {
                return Err(Error::new_spanned(
                    &name,
                    format_args!(
                        "alternative `{}` collides with `{}` as tag `{variant}`",
                        name.unraw(),
                        prev.name.unraw(),
                    ),
                ));
            }

            alts.push(Alt {
                attrs,
                name,
                variant,
                ty,
            });
        }

        Ok(UnionDecl {
            attrs,
            vis,
            ident,
            generics,
            alts,
            debug,
        })
    }
}

/// The type-level index of the alternative at `index`.
fn index_ty(index: usize) -> TokenStream {
    (0..index).fold(quote!(::tunion::tag::UTerm), |acc, _| {
        quote!(::tunion::tag::UInt<#acc>)
    })
}

fn expand_alt(alt: &Alt, index: &TokenStream) -> TokenStream {
    let Alt { attrs, name, ty, .. } = alt;
    let name = name.unraw();

    let create = format_ident!("create_{}", name);
    let emplace = format_ident!("emplace_{}", name);
    let get_ptr = format_ident!("get_{}_ptr", name);
    let get_mut = format_ident!("get_{}_mut", name);
    let get_ref = format_ident!("get_{}_ref", name);
    let get_ref_mut = format_ident!("get_{}_ref_mut", name);
    let into_unchecked = format_ident!("into_{}_unchecked", name);
    let into = format_ident!("into_{}", name);
    let holds = format_ident!("holds_{}", name);

    quote! {
        #(#attrs)*
        pub fn #create(value: #ty) -> Self {
            Self(::tunion::Union::create::<#index>(value))
        }

        pub fn #emplace(&mut self, value: #ty) -> &mut #ty {
            self.0.emplace::<#index>(value)
        }

        pub fn #get_ptr(&self) -> ::core::option::Option<&#ty> {
            self.0.get_ptr::<#index>()
        }

        pub fn #get_mut(&mut self) -> ::core::option::Option<&mut #ty> {
            self.0.get_mut::<#index>()
        }

        /// # Safety
        ///
        /// The alternative must be the active one.
        pub unsafe fn #get_ref(&self) -> &#ty {
            unsafe { self.0.get_unchecked::<#index>() }
        }

        /// # Safety
        ///
        /// The alternative must be the active one.
        pub unsafe fn #get_ref_mut(&mut self) -> &mut #ty {
            unsafe { self.0.get_unchecked_mut::<#index>() }
        }

        /// # Safety
        ///
        /// The alternative must be the active one.
        pub unsafe fn #into_unchecked(self) -> #ty {
            unsafe { self.0.into_unchecked::<#index>() }
        }

        pub fn #into(self) -> ::core::result::Result<#ty, ::tunion::WrongTag<Self>> {
            self.0.into_alt::<#index>().map_err(|err| err.map(Self))
        }

        pub fn #holds(&self) -> bool {
            self.0.holds::<#index>()
        }
    }
}

pub fn expand(decl: UnionDecl) -> TokenStream {
    let UnionDecl {
        attrs,
        vis,
        ident,
        generics,
        alts,
        debug,
    } = decl;

    let tag_ident = format_ident!("{}Tag", ident);
    let names_ident = format_ident!("{}Names", ident);
    let (impl_g, ty_g, where_c) = generics.split_for_impl();

    let len = alts.len();
    let tys: Vec<&Type> = alts.iter().map(|a| &a.ty).collect();
    let names: Vec<&Ident> = alts.iter().map(|a| &a.name).collect();
    let variants: Vec<&Ident> = alts.iter().map(|a| &a.variant).collect();
    let labels: Vec<String> = alts.iter().map(|a| a.name.unraw().to_string()).collect();
    let discrs = (0..=u8::MAX).take(len).map(Literal::u8_unsuffixed);
    let indices: Vec<TokenStream> = (0..len).map(index_ty).collect();

    let list = tys.iter().rev().fold(quote!(()), |acc, ty| quote!((#ty, #acc)));
    let alt_methods = alts.iter().zip(&indices).map(|(alt, index)| expand_alt(alt, index));

    let debug_impl = debug.then(|| {
        let mut generics = generics.clone();
        let clause = generics.make_where_clause();
        for ty in &tys {
            clause.predicates.push(parse_quote!(#ty: ::core::fmt::Debug));
        }
        let (impl_g, _, where_c) = generics.split_for_impl();
        let paths = labels.iter().map(|label| format!("{ident}::{label}"));

        quote! {
            impl #impl_g ::core::fmt::Debug for #ident #ty_g #where_c {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    match ::tunion::Declared::get_tag(self) {
                        #(#tag_ident::#variants => f
                            .debug_tuple(#paths)
                            .field(unsafe { self.0.get_unchecked::<#indices>() })
                            .finish(),)*
                    }
                }
            }
        }
    });

    quote! {
        #(#attrs)*
        #vis struct #ident #generics (::tunion::Union<#list>) #where_c;

        #[allow(dead_code)]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[repr(u8)]
        #vis enum #tag_ident {
            #(#variants = #discrs,)*
        }

        #[allow(dead_code)]
        impl #tag_ident {
            pub const ALL: [Self; #len] = [#(Self::#variants),*];

            pub const fn name(self) -> &'static str {
                match self {
                    #(Self::#variants => #labels,)*
                }
            }

            pub const fn index(self) -> u8 {
                self as u8
            }
        }

        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug)]
        #vis struct #names_ident {
            #(pub #names: ::tunion::tag::Witness<#indices>,)*
        }

        #[allow(dead_code)]
        impl #impl_g #ident #ty_g #where_c {
            #(#alt_methods)*

            pub fn create<__U>(value: ::tunion::Payload<#list, __U>) -> Self
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                Self(::tunion::Union::create::<__U>(value))
            }

            pub fn emplace<__U>(&mut self, value: ::tunion::Payload<#list, __U>) -> &mut ::tunion::Payload<#list, __U>
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                self.0.emplace::<__U>(value)
            }

            pub fn get_ptr<__U>(&self) -> ::core::option::Option<&::tunion::Payload<#list, __U>>
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                self.0.get_ptr::<__U>()
            }

            pub fn get_mut<__U>(&mut self) -> ::core::option::Option<&mut ::tunion::Payload<#list, __U>>
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                self.0.get_mut::<__U>()
            }

            /// # Safety
            ///
            /// The alternative at `__U` must be the active one.
            pub unsafe fn get_ref<__U>(&self) -> &::tunion::Payload<#list, __U>
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                unsafe { self.0.get_unchecked::<__U>() }
            }

            pub fn holds<__U>(&self) -> bool
            where
                __U: ::tunion::tag::Index,
                #list: ::tunion::repr::Slot<__U>,
            {
                self.0.holds::<__U>()
            }

            pub fn get_tag(&self) -> #tag_ident {
                ::tunion::Declared::get_tag(self)
            }

            pub fn visit<'__a, __H>(&'__a self, handler: __H) -> __H::Output
            where
                __H: ::tunion::visit::Visitor,
                #list: ::tunion::visit::Walk<'__a, Self, ::tunion::tag::UTerm, ::tunion::visit::ByRef, __H>,
            {
                ::tunion::Tagged::visit(self, handler)
            }

            pub fn visit_mut<'__a, __H>(&'__a mut self, handler: __H) -> __H::Output
            where
                __H: ::tunion::visit::Visitor,
                #list: ::tunion::visit::Walk<'__a, Self, ::tunion::tag::UTerm, ::tunion::visit::ByMut, __H>,
            {
                ::tunion::Tagged::visit_mut(self, handler)
            }

            pub fn into_visit<'__a, __H>(self, handler: __H) -> __H::Output
            where
                Self: '__a,
                __H: ::tunion::visit::Visitor,
                #list: ::tunion::visit::Walk<'__a, Self, ::tunion::tag::UTerm, ::tunion::visit::ByValue, __H>,
            {
                ::tunion::Tagged::into_visit(self, handler)
            }

            pub fn matcher<'__a, __R>(&'__a self) -> ::tunion::Matcher<'__a, Self, ::tunion::visit::ByRef, (), ::tunion::combine::NoDefault, __R> {
                ::tunion::Tagged::matcher(self)
            }

            pub fn matcher_mut<'__a, __R>(&'__a mut self) -> ::tunion::Matcher<'__a, Self, ::tunion::visit::ByMut, (), ::tunion::combine::NoDefault, __R> {
                ::tunion::Tagged::matcher_mut(self)
            }

            pub fn into_matcher<'__a, __R>(self) -> ::tunion::Matcher<'__a, Self, ::tunion::visit::ByValue, (), ::tunion::combine::NoDefault, __R>
            where
                Self: '__a,
            {
                ::tunion::Tagged::into_matcher(self)
            }
        }

        unsafe impl #impl_g ::tunion::Tagged for #ident #ty_g #where_c {
            type List = #list;

            fn as_union(&self) -> &::tunion::Union<#list> {
                &self.0
            }

            fn as_union_mut(&mut self) -> &mut ::tunion::Union<#list> {
                &mut self.0
            }

            fn into_union(self) -> ::tunion::Union<#list> {
                self.0
            }
        }

        impl #impl_g ::tunion::Declared for #ident #ty_g #where_c {
            type Tag = #tag_ident;
            type Names = #names_ident;

            const NAMES: #names_ident = #names_ident {
                #(#names: ::tunion::tag::Witness::new(),)*
            };

            fn get_tag(&self) -> #tag_ident {
                #tag_ident::ALL[usize::from(self.0.tag())]
            }
        }

        #debug_impl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: TokenStream) -> Result<UnionDecl> {
        parse2(tokens)
    }

    fn error(tokens: TokenStream) -> String {
        match parse(tokens) {
            Ok(_) => panic!("declaration was accepted"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn alternatives_and_tags() {
        let decl = parse(quote! {
            pub union Value { index: i32, value: i32, name: String, point_xy: (i32, i32) }
        })
        .unwrap();

        assert_eq!(decl.alts.len(), 4);
        let variants: Vec<String> = decl.alts.iter().map(|a| a.variant.to_string()).collect();
        assert_eq!(variants, ["Index", "Value", "Name", "PointXy"]);
        assert!(!decl.debug);
    }

    #[test]
    fn debug_is_intercepted() {
        let decl = parse(quote! {
            #[derive(Clone, Debug, PartialEq)]
            union Value { a: u8 }
        })
        .unwrap();

        assert!(decl.debug);
        assert_eq!(decl.attrs.len(), 1);
        let derive = &decl.attrs[0];
        assert_eq!(
            quote!(#derive).to_string(),
            quote!(#[derive(Clone, PartialEq)]).to_string()
        );
    }

    #[test]
    fn debug_only_derive_is_dropped() {
        let decl = parse(quote! {
            #[derive(Debug)]
            #[doc = "docs"]
            union Value { a: u8 }
        })
        .unwrap();

        assert!(decl.debug);
        assert_eq!(decl.attrs.len(), 1);
        assert!(decl.attrs[0].path().is_ident("doc"));
    }

    #[test]
    fn rejected_declarations() {
        assert!(error(quote!(union Empty {})).contains("at least one alternative"));
        assert!(error(quote!(#[derive(Clone, Copy)] union U { a: u8 })).contains("cannot be `Copy`"));
        assert!(error(quote!(union U { a: u8, a: u16 })).contains("duplicate alternative `a`"));
        assert!(error(quote!(union U { foo_bar: u8, fooBar: u16 })).contains("collides with `foo_bar`"));
        assert!(error(quote!(union U { pub a: u8 })).contains("visibility"));
    }

    #[test]
    fn too_many_alternatives() {
        let fields = (0..33u32).map(|i| format_ident!("a{}", i));
        let err = error(quote!(union Big { #(#fields: u8),* }));
        assert!(err.contains("at most 32"));

        let fields = (0..32u32).map(|i| format_ident!("a{}", i));
        assert!(parse(quote!(union Big { #(#fields: u8),* })).is_ok());
    }

    #[test]
    fn nested_index_types() {
        let compact = |tokens: TokenStream| tokens.to_string().replace(' ', "");
        assert_eq!(compact(index_ty(0)), "::tunion::tag::UTerm");
        assert_eq!(
            compact(index_ty(2)),
            "::tunion::tag::UInt<::tunion::tag::UInt<::tunion::tag::UTerm>>"
        );
    }

    #[test]
    fn raw_names_drop_prefix() {
        let decl = parse(quote!(union Token { r#type: u8 })).unwrap();
        assert_eq!(decl.alts[0].variant.to_string(), "Type");

        let out = expand(decl).to_string();
        assert!(out.contains("create_type"));
        assert!(out.contains("r#type"));
    }
}
