use std::iter;

use const_random::const_random;
use either::Either::{Left, Right};
use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{parse::Parse, spanned::Spanned, visit::Visit, *};

/// How the scrutinee is bound by the generated matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ref,
    Mut,
    Value,
}

enum ArmKind {
    /// `a(p) | b(q)`: one case per alternative.
    Cases(Vec<(Ident, Pat)>),
    /// `_` or a plain binding of the whole value.
    Default(Pat),
}

pub struct UnionArm {
    kind: ArmKind,
    body: Box<Expr>,
}

/// Rejects control flow that would leave the generated closure instead of
/// the enclosing function.
#[derive(Default)]
struct Escapes {
    loops: usize,
    labels: Vec<Ident>,
    err: Option<Error>,
}

impl Escapes {
    fn flag(&mut self, tokens: impl ToTokens, what: &str) {
        if self.err.is_none() {
            self.err = Some(Error::new_spanned(
                tokens,
                format_args!("{what} cannot escape a `match_union!` arm"),
            ));
        }
    }

    fn reaches(&self, label: Option<&Lifetime>) -> bool {
        match label {
            Some(label) => self.labels.contains(&label.ident),
            None => self.loops > 0,
        }
    }

    fn enter_loop(&mut self, label: Option<&Label>, f: impl FnOnce(&mut Self)) {
        if let Some(label) = label {
            self.labels.push(label.name.ident.clone());
        }
        self.loops += 1;
        f(self);
        self.loops -= 1;
        if label.is_some() {
            self.labels.pop();
        }
    }
}

impl Visit<'_> for Escapes {
    fn visit_expr_return(&mut self, i: &ExprReturn) {
        self.flag(i.return_token, "`return`");
    }

    fn visit_expr_try(&mut self, i: &ExprTry) {
        self.flag(i.question_token, "`?`");
    }

    fn visit_expr_await(&mut self, i: &ExprAwait) {
        self.flag(i.await_token, "`.await`");
    }

    fn visit_expr_break(&mut self, i: &ExprBreak) {
        if !self.reaches(i.label.as_ref()) {
            self.flag(i.break_token, "`break`");
            return;
        }
        visit::visit_expr_break(self, i)
    }

    fn visit_expr_continue(&mut self, i: &ExprContinue) {
        if !self.reaches(i.label.as_ref()) {
            self.flag(i.continue_token, "`continue`");
        }
    }

    fn visit_expr_loop(&mut self, i: &ExprLoop) {
        self.enter_loop(i.label.as_ref(), |this| visit::visit_expr_loop(this, i));
    }

    fn visit_expr_while(&mut self, i: &ExprWhile) {
        self.enter_loop(i.label.as_ref(), |this| visit::visit_expr_while(this, i));
    }

    fn visit_expr_for_loop(&mut self, i: &ExprForLoop) {
        self.enter_loop(i.label.as_ref(), |this| visit::visit_expr_for_loop(this, i));
    }

    fn visit_expr_block(&mut self, i: &ExprBlock) {
        match &i.label {
            Some(label) => {
                self.labels.push(label.name.ident.clone());
                visit::visit_expr_block(self, i);
                self.labels.pop();
            }
            None => visit::visit_expr_block(self, i),
        }
    }

    // Own control-flow scopes.
    fn visit_expr_closure(&mut self, _: &ExprClosure) {}
    fn visit_expr_async(&mut self, _: &ExprAsync) {}
    fn visit_item(&mut self, _: &Item) {}
}

fn unsupported(pat: &Pat) -> Error {
    Error::new_spanned(
        pat,
        format_args!(
            "pattern {} is not supported; expected `alternative(pattern)`, a binding or `_`",
            pat.to_token_stream()
        ),
    )
}

fn alternative(pat: Pat) -> Result<(Ident, Pat)> {
    match pat {
        Pat::Paren(paren) => alternative(*paren.pat),
        Pat::TupleStruct(PatTupleStruct {
            qself: None,
            path,
            elems,
            ..
        }) => {
            let name = path
                .get_ident()
                .cloned()
                .ok_or_else(|| Error::new_spanned(&path, "expected an alternative name"))?;
            let mut elems = elems.into_iter();
            match (elems.next(), elems.next()) {
                (Some(Pat::Rest(rest)), None) => {
                    let wild = PatWild {
                        attrs: rest.attrs,
                        underscore_token: Token![_](rest.dot2_token.span()),
                    };
                    Ok((name, Pat::Wild(wild)))
                }
                (Some(pat), None) => Ok((name, pat)),
                _ => Err(Error::new_spanned(
                    &path,
                    format_args!("expected exactly one pattern for alternative `{name}`"),
                )),
            }
        }
        pat => Err(unsupported(&pat)),
    }
}

fn classify(pat: Pat) -> Result<ArmKind> {
    match pat {
        Pat::Wild(_) | Pat::Ident(PatIdent { subpat: None, .. }) => Ok(ArmKind::Default(pat)),
        Pat::Or(or) => {
            let cases = or.cases.into_iter().map(alternative);
            cases.collect::<Result<Vec<_>>>().map(ArmKind::Cases)
        }
        pat => alternative(pat).map(|case| ArmKind::Cases(vec![case])),
    }
}

impl Parse for UnionArm {
    fn parse(input: parse::ParseStream<'_>) -> Result<Self> {
        let Arm {
            attrs,
            pat,
            guard,
            body,
            ..
        } = input.parse()?;

        if let Some(attr) = attrs.first() {
            return Err(Error::new_spanned(
                attr,
                "custom attributes are not supported on match arms",
            ));
        }
        if let Some((if_token, guard)) = guard {
            return Err(Error::new(
                if_token.span.join(guard.span()).unwrap_or(if_token.span),
                "guards are not supported; match inside the arm instead",
            ));
        }

        let mut escapes = Escapes::default();
        escapes.visit_expr(&body);
        if let Some(err) = escapes.err {
            return Err(err);
        }

        Ok(UnionArm {
            kind: classify(pat)?,
            body,
        })
    }
}

pub struct UnionMatch {
    mode: Mode,
    expr: Box<Expr>,
    arms: Vec<UnionArm>,
}

impl Parse for UnionMatch {
    fn parse(input: parse::ParseStream<'_>) -> Result<Self> {
        let expr = Expr::parse_without_eager_brace(input)?;
        let (mode, expr) = match expr {
            Expr::Reference(ExprReference {
                mutability, expr, ..
            }) => match mutability {
                Some(_) => (Mode::Mut, expr),
                None => (Mode::Ref, expr),
            },
            expr => (Mode::Value, Box::new(expr)),
        };

        let content;
        braced!(content in input);

        let mut arms: Vec<UnionArm> = Vec::new();
        while !content.is_empty() {
            let arm: UnionArm = content.parse()?;
            if let ArmKind::Default(pat) = &arm.kind {
                if arms.iter().any(|a| matches!(a.kind, ArmKind::Default(_))) {
                    return Err(Error::new_spanned(
                        pat,
                        "a `match_union!` takes at most one default arm",
                    ));
                }
            }
            arms.push(arm);
        }

        Ok(UnionMatch { mode, expr, arms })
    }
}

/// The scrutinee as a method receiver.
fn receiver(expr: &Expr) -> TokenStream {
    match expr {
        Expr::Unary(_) | Expr::Reference(_) | Expr::Cast(_) => quote!((#expr)),
        expr => quote!(#expr),
    }
}

pub fn expand_match(data: UnionMatch) -> TokenStream {
    let UnionMatch { mode, expr, arms } = data;
    let matcher = format_ident!("__union_matcher{}", const_random!(u32));
    let names = format_ident!("__union_names{}", const_random!(u32));

    let start = match mode {
        Mode::Ref => {
            let receiver = receiver(&expr);
            quote!(#receiver.matcher())
        }
        Mode::Mut => {
            let receiver = receiver(&expr);
            quote!(#receiver.matcher_mut())
        }
        Mode::Value => quote!(::tunion::Tagged::into_matcher(#expr)),
    };

    // Temporaries in the scrutinee live until the end of the `match`.
    if arms.is_empty() {
        return quote! {{
            use ::tunion::Tagged as _;
            match #start {
                #matcher => {
                    let () = #matcher.run();
                }
            }
        }};
    }

    let cases = arms.iter().flat_map(|arm| match &arm.kind {
        ArmKind::Cases(cases) => Left(cases.iter().zip(iter::repeat(&arm.body)).map(
            |((alt, pat), body)| quote!(.case(#names.#alt, |#pat| #body)),
        )),
        ArmKind::Default(_) => Right(iter::empty()),
    });
    let default = arms.iter().find_map(|arm| match &arm.kind {
        ArmKind::Default(pat) => {
            let body = &arm.body;
            Some(quote!(.otherwise(|#pat| #body)))
        }
        ArmKind::Cases(_) => None,
    });

    quote! {{
        use ::tunion::Tagged as _;
        match #start {
            #matcher => {
                #[allow(unused_variables)]
                let #names = #matcher.names();
                #matcher #(#cases)* #default .run()
            }
        }
    }}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: TokenStream) -> Result<UnionMatch> {
        parse2(tokens)
    }

    fn error(tokens: TokenStream) -> String {
        match parse(tokens) {
            Ok(_) => panic!("match was accepted"),
            Err(err) => err.to_string(),
        }
    }

    fn case_names(m: &UnionMatch) -> Vec<String> {
        m.arms
            .iter()
            .flat_map(|arm| match &arm.kind {
                ArmKind::Cases(cases) => Left(cases.iter().map(|(alt, _)| alt.to_string())),
                ArmKind::Default(_) => Right(iter::empty()),
            })
            .collect()
    }

    #[test]
    fn scrutinee_modes() {
        assert_eq!(parse(quote!(&u {})).unwrap().mode, Mode::Ref);
        assert_eq!(parse(quote!(&mut u {})).unwrap().mode, Mode::Mut);
        assert_eq!(parse(quote!(u {})).unwrap().mode, Mode::Value);
        assert_eq!(parse(quote!(make() {})).unwrap().mode, Mode::Value);
    }

    #[test]
    fn or_patterns_register_each_alternative() {
        let m = parse(quote!(&u {
            index(i) | value(i) => *i,
            point(&(x, y)) => x + y,
            (name(..)) => 0,
            other => -1,
        }))
        .unwrap();

        assert_eq!(case_names(&m), ["index", "value", "point", "name"]);
        assert_eq!(m.arms.len(), 4);
        assert!(matches!(m.arms[3].kind, ArmKind::Default(Pat::Ident(_))));
        match &m.arms[2].kind {
            ArmKind::Cases(cases) => assert!(matches!(cases[0].1, Pat::Wild(_))),
            ArmKind::Default(_) => panic!("expected a case"),
        }
    }

    #[test]
    fn rejected_arms() {
        assert!(error(quote!(u { a(x) if x > 0 => 1, _ => 0 })).contains("guards"));
        assert!(error(quote!(u { #[cold] a(x) => 1 })).contains("attributes"));
        assert!(error(quote!(u { _ => 0, other => 1 })).contains("at most one default"));
        assert!(error(quote!(u { (a, b) => 0 })).contains("not supported"));
        assert!(error(quote!(u { a(x) | other => 0 })).contains("not supported"));
        assert!(error(quote!(u { a(x, y) => 0 })).contains("exactly one pattern"));
    }

    #[test]
    fn escaping_control_flow() {
        assert!(error(quote!(u { a(x) => return x })).contains("`return`"));
        assert!(error(quote!(u { a(x) => x.parse()? })).contains("`?`"));
        assert!(error(quote!(u { a(x) => break })).contains("`break`"));
        assert!(error(quote!(u { a(x) => { 'l: loop { for _ in x { break 'm; } } } })).contains("`break`"));

        assert!(parse(quote!(u {
            a(x) => {
                'l: loop {
                    for i in x {
                        if i { continue; }
                        break 'l;
                    }
                }
                let f = || -> Option<u8> { Some(x?) };
                f()
            }
        }))
        .is_ok());
    }

    #[test]
    fn expansion_builds_a_matcher_chain() {
        let out = expand_match(parse(quote!(&mut u { a(x) => x.push(1), _ => () })).unwrap()).to_string();
        assert!(out.contains("matcher_mut"));
        assert!(out.contains(". case"));
        assert!(out.contains(". otherwise"));
        assert!(out.contains(". run ()"));

        let out = expand_match(parse(quote!(u {})).unwrap()).to_string();
        assert!(out.contains("into_matcher"));
        assert!(out.contains("let () ="));
    }
}
