use proc_macro::TokenStream;

mod decl;
mod pat;

#[proc_macro]
pub fn tagged_union(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as decl::UnionDecl);
    decl::expand(input).into()
}

#[proc_macro]
pub fn match_union(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as pat::UnionMatch);
    pat::expand_match(input).into()
}
