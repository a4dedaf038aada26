mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs a test inside a fresh `pledge::EventLoop`.
///
/// The body executes with the loop entered, so `pledge::resolve`,
/// `pledge::all` and friends work without a handle. Once the body returns
/// the loop is run until it has no jobs or timers left, which means every
/// continuation the test attached has executed before the test finishes.
///
/// A declared return type, such as `Result<(), E>`, is kept: the body's
/// value is returned once the loop has been drained.
///
/// The function may take one parameter of type `&EventLoop`, which is bound
/// to the loop driving the test:
///
/// ```rust,ignore
/// #[pledge::test]
/// fn settles(event_loop: &pledge::EventLoop) {
///     let p = pledge::resolve::<_, ()>(1);
///     event_loop.run();
///     assert_eq!(p.outcome(), Some(Ok(1)));
/// }
/// ```
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    let Some(fn_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"))
    else {
        return utils::compile_error("#[pledge::test] must be applied to a function");
    };

    let Some(params_pos) = utils::find_group(&tokens, fn_pos, Delimiter::Parenthesis) else {
        return utils::compile_error("#[pledge::test] could not find the parameter list");
    };

    let Some(body_pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return utils::compile_error("#[pledge::test] expects a function body");
    };

    let param = match &tokens[params_pos] {
        TokenTree::Group(g) => utils::tokens_to_string(&g.stream().into_iter().collect::<Vec<_>>()),
        _ => String::new(),
    };

    let block = match &tokens[body_pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let param = param.trim().trim_end_matches(',');

    let closure = match utils::return_type(&tokens[params_pos + 1..body_pos]) {
        Some(ty) => format!("|| -> {ty}"),
        None => String::from("||"),
    };

    let bind = if param.is_empty() {
        String::new()
    } else {
        format!("let {param} = &__pledge_event_loop;")
    };

    let new_block = format!(
        "{{
        let __pledge_event_loop = ::pledge::EventLoop::new();
        {bind}
        let __pledge_result = __pledge_event_loop.enter({closure} {{ {block} }});
        __pledge_event_loop.run();
        __pledge_result
    }}"
    );

    let body = match new_block.parse::<TokenStream>() {
        Ok(ts) => ts,
        Err(err) => return utils::compile_error(&format!("pledge::test macro error: {err}")),
    };

    tokens[params_pos] = TokenTree::Group(Group::new(Delimiter::Parenthesis, TokenStream::new()));
    tokens[body_pos] = TokenTree::Group(Group::new(Delimiter::Brace, body));

    let test_attr: TokenStream = "#[test]".parse().unwrap();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
