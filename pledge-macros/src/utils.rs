use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Returns the index of the first group with `delimiter` after `start`.
pub(crate) fn find_group(
    tokens: &[TokenTree],
    start: usize,
    delimiter: Delimiter,
) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, t)| matches!(t, TokenTree::Group(g) if g.delimiter() == delimiter))
        .map(|(i, _)| i)
}

/// Converts a slice of tokens into a Rust source string.
///
/// Consecutive identifiers are separated by a space so they are not
/// merged (`mut event_loop` vs `mutevent_loop`).
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let is_ident = matches!(t, TokenTree::Ident(_));

        if prev_was_ident && is_ident {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = is_ident;
    }

    out
}

/// Returns the declared return type found between the parameter list and
/// the body, if any.
///
/// Stops at a `where` clause.
pub(crate) fn return_type(tokens: &[TokenTree]) -> Option<String> {
    let arrow = tokens.windows(2).position(|pair| {
        matches!(
            (&pair[0], &pair[1]),
            (TokenTree::Punct(dash), TokenTree::Punct(gt))
                if dash.as_char() == '-' && gt.as_char() == '>'
        )
    })?;

    let ty: Vec<TokenTree> = tokens[arrow + 2..]
        .iter()
        .take_while(|t| !matches!(t, TokenTree::Ident(id) if id.to_string() == "where"))
        .cloned()
        .collect();

    Some(tokens_to_string(&ty))
}

/// Expands to a `compile_error!` carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});").parse().unwrap()
}
