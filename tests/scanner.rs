use treelox::error::Diagnostics;
use treelox::scanner::Scanner;
use treelox::token::TokenType;

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);

    assert!(
        !diagnostics.had_error(),
        "unexpected scan errors: {:?}",
        diagnostics.errors()
    );
    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn maximal_munch_operators() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    assert_token_sequence(
        "var class whilefor fun _under score9",
        &[
            (TokenType::VAR, "var"),
            (TokenType::CLASS, "class"),
            (TokenType::IDENTIFIER, "whilefor"),
            (TokenType::FUN, "fun"),
            (TokenType::IDENTIFIER, "_under"),
            (TokenType::IDENTIFIER, "score9"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn number_literals() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new("123 3.14 7.").scan_tokens(&mut diagnostics);

    assert!(!diagnostics.had_error());

    // `7.` is a number followed by a dot: the fraction needs a digit.
    assert_eq!(tokens[0].token_type, TokenType::NUMBER(0.0));
    assert_eq!(tokens[0].lexeme, "123");
    assert_eq!(tokens[1].lexeme, "3.14");
    assert_eq!(tokens[2].lexeme, "7");
    assert_eq!(tokens[3].token_type, TokenType::DOT);

    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(n, 3.14),
        ref other => panic!("expected NUMBER, got {:?}", other),
    }
}

#[test]
fn string_literal_spans_lines() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new("\"one\ntwo\" x").scan_tokens(&mut diagnostics);

    assert!(!diagnostics.had_error());

    match tokens[0].token_type {
        TokenType::STRING(ref s) => assert_eq!(s, "one\ntwo"),
        ref other => panic!("expected STRING, got {:?}", other),
    }

    // The embedded newline advanced the line counter.
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn comments_are_discarded() {
    assert_token_sequence(
        "a // the rest is gone != ==\nb",
        &[
            (TokenType::IDENTIFIER, "a"),
            (TokenType::IDENTIFIER, "b"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn unexpected_characters_are_reported_and_skipped() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new(",.$(#").scan_tokens(&mut diagnostics);

    // Scanning continued past both bad characters.
    assert_eq!(tokens.len(), 4); // , . ( EOF
    assert_eq!(tokens[0].token_type, TokenType::COMMA);
    assert_eq!(tokens[1].token_type, TokenType::DOT);
    assert_eq!(tokens[2].token_type, TokenType::LEFT_PAREN);
    assert_eq!(tokens[3].token_type, TokenType::EOF);

    assert!(diagnostics.had_error());
    assert_eq!(diagnostics.errors().len(), 2);

    for error in diagnostics.errors() {
        assert!(error.to_string().contains("Unexpected character"));
    }
}

#[test]
fn unterminated_string_is_reported() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new("\"no closing quote").scan_tokens(&mut diagnostics);

    assert!(diagnostics.had_error());
    assert!(diagnostics.errors()[0]
        .to_string()
        .contains("Unterminated string."));

    // Still EOF-terminated.
    assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
}

#[test]
fn tokens_serialize_for_structured_dumps() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new("var x = 1;").scan_tokens(&mut diagnostics);

    let dump = serde_json::to_value(&tokens).expect("tokens should serialize");

    assert_eq!(dump[0]["token_type"], "VAR");
    assert_eq!(dump[1]["lexeme"], "x");
    assert_eq!(dump[3]["token_type"]["NUMBER"], 1.0);
    assert_eq!(dump[5]["token_type"], "EOF");
}

#[test]
fn line_numbers_track_newlines() {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new("a\nb\n\nc").scan_tokens(&mut diagnostics);

    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 4);
}
