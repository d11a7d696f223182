use proptest::prelude::*;
use stepwise::lexer::{LexicalErrorKind, Lexer, Token, TokenKind};

fn check(input: &str, expected: &[(TokenKind, &str, u32)], test_name: &str) {
    let mut scanner = Lexer::new(input);
    let mut actual = Vec::new();
    loop {
        let token = scanner
            .next_token()
            .unwrap_or_else(|error| panic!("Failed the test {test_name}: {error}"));
        if token.kind == TokenKind::Eof {
            break;
        }
        let lexeme = scanner.get_lexeme(&token.span).unwrap_or_default();
        actual.push((token.kind, lexeme, token.line));
    }
    assert_eq!(actual, expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", &[], "smoke");
}

#[test]
fn test_declaration() {
    check(
        "let total = 1.5;",
        &[
            (TokenKind::KeywordLet, "let", 1),
            (TokenKind::Ident, "total", 1),
            (TokenKind::Equal, "=", 1),
            (TokenKind::NumericLiteral, "1.5", 1),
            (TokenKind::Semicolon, ";", 1),
        ],
        "declaration",
    );
}

#[test]
fn test_operators() {
    check(
        "a === b !== c == d != e && f || g <= h >= i % j",
        &[
            (TokenKind::Ident, "a", 1),
            (TokenKind::EqualEqualEqual, "===", 1),
            (TokenKind::Ident, "b", 1),
            (TokenKind::BangEqualEqual, "!==", 1),
            (TokenKind::Ident, "c", 1),
            (TokenKind::EqualEqual, "==", 1),
            (TokenKind::Ident, "d", 1),
            (TokenKind::BangEqual, "!=", 1),
            (TokenKind::Ident, "e", 1),
            (TokenKind::AmpersandAmpersand, "&&", 1),
            (TokenKind::Ident, "f", 1),
            (TokenKind::PipePipe, "||", 1),
            (TokenKind::Ident, "g", 1),
            (TokenKind::LessThanEqual, "<=", 1),
            (TokenKind::Ident, "h", 1),
            (TokenKind::GreaterThanEqual, ">=", 1),
            (TokenKind::Ident, "i", 1),
            (TokenKind::Percent, "%", 1),
            (TokenKind::Ident, "j", 1),
        ],
        "operators",
    );
}

#[test]
fn test_lines_and_comments() {
    check(
        "// heading\nconsole.log('hi') /* inline\nblock */\nx",
        &[
            (TokenKind::Ident, "console", 2),
            (TokenKind::Dot, ".", 2),
            (TokenKind::Ident, "log", 2),
            (TokenKind::LeftParenthesis, "(", 2),
            (TokenKind::StringLiteral, "'hi'", 2),
            (TokenKind::RightParenthesis, ")", 2),
            (TokenKind::Ident, "x", 4),
        ],
        "lines and comments",
    );
}

#[test]
fn test_unterminated_string() {
    let mut scanner = Lexer::new("let s = \"open\nlet t = 1;");
    let error = scanner
        .find_map(Result::err)
        .expect("an unterminated string is an error");
    assert_eq!(error.kind, LexicalErrorKind::UnclosedString);
    assert_eq!(error.line, 1);
}

#[test]
fn test_unrecognized_character() {
    let mut scanner = Lexer::new("let a = 1 # 2;");
    let error = scanner
        .find_map(Result::err)
        .expect("`#` is not a token");
    assert_eq!(error.kind, LexicalErrorKind::Unrecognized('#'));
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just(":".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just(";".to_string()),
        Just("*".to_string()),
        Just("%".to_string()),
        Just("!".to_string()),
        Just("!=".to_string()),
        Just("!==".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("===".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
        Just("&&".to_string()),
        Just("||".to_string()),
        Just("/".to_string()),
    ]
}

fn numeric_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]+".prop_map(|s| s),          // Integer literals
        "[0-9]+\\.[0-9]+".prop_map(|s| s)  // Decimal literals
    ]
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[^\"\\\\\n]*".prop_map(|s: String| format!("\"{}\"", s)),
        "[^'\\\\\n]*".prop_map(|s: String| format!("'{}'", s)),
    ]
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_$][a-zA-Z0-9_$]*".prop_map(|s: String| s)
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("break".to_string()),
        Just("const".to_string()),
        Just("continue".to_string()),
        Just("else".to_string()),
        Just("false".to_string()),
        Just("for".to_string()),
        Just("function".to_string()),
        Just("if".to_string()),
        Just("let".to_string()),
        Just("null".to_string()),
        Just("return".to_string()),
        Just("true".to_string()),
        Just("undefined".to_string()),
        Just("var".to_string()),
        Just("while".to_string()),
    ]
}

fn comment_strategy() -> impl Strategy<Value = String> {
    "[^\n]*".prop_map(|s: String| format!("//{}\n", s))
}

fn token_sequence_with_comments_strategy() -> impl Strategy<Value = String> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
            comment_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
    .prop_map(|tokens| tokens.join(" "))
}

fn token_sequence_without_comments_strategy() -> impl Strategy<Value = Vec<String>> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
}

proptest! {
    #[test]
    fn lexer_handles_valid_tokens_without_comments(input in token_sequence_without_comments_strategy()) {
        // Add 1 to include EOF token
        let expected_num_tokens = input.len() + 1;
        let input = input.join(" ");
        let mut scanner = Lexer::new(&input);
        let mut num_tokens = 0;
        loop {
            num_tokens += 1;
            match scanner.next_token() {
                Ok(Token {kind: TokenKind::Eof, ..}) => {
                    break;
                },
                token => {
                    prop_assert!(token.is_ok());
                }
            }
        }
        prop_assert_eq!(num_tokens, expected_num_tokens);
    }

    #[test]
    fn lexer_handles_valid_tokens_with_comments(input in token_sequence_with_comments_strategy()) {
        let mut scanner = Lexer::new(&input);
        loop {
            match scanner.next_token() {
                Ok(Token {kind: TokenKind::Eof, ..}) => {
                    break;
                },
                token => {
                    prop_assert!(token.is_ok());
                }
            }
        }
    }
}
