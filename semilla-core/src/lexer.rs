//! Lexer for the Semilla language.
//!
//! Scanning follows a fixed priority at every position: comments,
//! decimal numbers before integers, quoted strings, identifiers (with
//! reserved words retagged), two-character comparisons before `=`,
//! `<` and `>`, single-character operators and delimiters, and finally
//! whitespace. Any other character becomes an [`TokenKind::Error`]
//! token in place; the pipeline turns those into diagnostics.
//!
//! Before any of that, a pre-pass rejects block comments and string
//! literals that never close. Those are fatal: no tokens are produced.

use log::debug;

use crate::diagnostic::Diagnostic;

/// The ten reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Type names
    Integer,  // entero
    Decimal,  // decimal
    Boolean,  // booleano
    String,   // cadena

    // Control flow
    If,       // si
    Else,     // sino
    While,    // mientras
    Do,       // hacer

    // Boolean literals
    True,     // verdadero
    False,    // falso
}

impl Keyword {
    pub fn lookup(text: &str) -> Option<Keyword> {
        let keyword = match text {
            "entero" => Keyword::Integer,
            "decimal" => Keyword::Decimal,
            "booleano" => Keyword::Boolean,
            "cadena" => Keyword::String,
            "si" => Keyword::If,
            "sino" => Keyword::Else,
            "mientras" => Keyword::While,
            "hacer" => Keyword::Do,
            "verdadero" => Keyword::True,
            "falso" => Keyword::False,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Integer => "entero",
            Keyword::Decimal => "decimal",
            Keyword::Boolean => "booleano",
            Keyword::String => "cadena",
            Keyword::If => "si",
            Keyword::Else => "sino",
            Keyword::While => "mientras",
            Keyword::Do => "hacer",
            Keyword::True => "verdadero",
            Keyword::False => "falso",
        }
    }

    /// Whether this keyword names one of the four primitive types.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Keyword::Integer | Keyword::Decimal | Keyword::Boolean | Keyword::String
        )
    }
}

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals and names
    IntLiteral,
    DecimalLiteral,
    StringLiteral,
    Ident,
    Keyword(Keyword),

    // Operators
    Assign,     // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    EqEq,       // ==
    NotEq,      // !=
    LessEq,     // <=
    GreaterEq,  // >=
    Less,       // <
    Greater,    // >

    // Delimiters
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    Semi,       // ;
    Comma,      // ,
    Dot,        // .

    /// A character no other class matched.
    Error,
}

impl TokenKind {
    /// Human-readable name used in "expected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::DecimalLiteral => "decimal literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::Keyword(keyword) => keyword.as_str(),
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::LessEq => "'<='",
            TokenKind::GreaterEq => "'>='",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Error => "unrecognized character",
        }
    }
}

/// A single token: its kind, the exact text it was matched from, and
/// the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}

/// Lex a source string into tokens.
///
/// Returns the single fatal diagnostic of the pre-pass when a block
/// comment or string literal is left open. Unrecognized characters do
/// not fail here; they show up as [`TokenKind::Error`] tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    prescan(source, Prescan::BlockComments)?;
    prescan(source, Prescan::StringLiterals)?;

    let mut lexer = Lexer {
        source,
        chars: source.as_bytes(),
        index: 0,
        line: 1,
    };
    let tokens = lexer.run();
    debug!("lexed {} tokens over {} lines", tokens.len(), lexer.line);
    Ok(tokens)
}

/// Collect the inline error tokens as lexical diagnostics.
pub fn lexical_errors(tokens: &[Token]) -> Vec<Diagnostic> {
    tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Error)
        .map(|token| {
            Diagnostic::lexical(format!("unexpected character '{}'", token.lexeme), token.line)
        })
        .collect()
}

struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    index: usize,
    line: u32,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            let start = self.index;
            let line = self.line;

            let kind = match ch {
                b'\n' => {
                    self.consume_char();
                    self.line += 1;
                    continue;
                }
                b' ' | b'\t' | b'\r' => {
                    self.consume_char();
                    continue;
                }
                b'/' if self.peek_next() == Some(b'/') => {
                    self.skip_line_comment();
                    continue;
                }
                b'/' if self.peek_next() == Some(b'*') => {
                    self.skip_block_comment();
                    continue;
                }
                b'0'..=b'9' => self.lex_number(),
                b'"' | b'\'' => self.lex_string(ch),
                _ if is_ident_start(ch) => self.lex_ident_or_keyword(start),
                b'=' => self.one_or_two(TokenKind::Assign, TokenKind::EqEq),
                b'<' => self.one_or_two(TokenKind::Less, TokenKind::LessEq),
                b'>' => self.one_or_two(TokenKind::Greater, TokenKind::GreaterEq),
                b'!' if self.peek_next() == Some(b'=') => {
                    self.consume_char();
                    self.consume_char();
                    TokenKind::NotEq
                }
                b'+' => self.single(TokenKind::Plus),
                b'-' => self.single(TokenKind::Minus),
                b'*' => self.single(TokenKind::Star),
                b'/' => self.single(TokenKind::Slash),
                b'%' => self.single(TokenKind::Percent),
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b'{' => self.single(TokenKind::LBrace),
                b'}' => self.single(TokenKind::RBrace),
                b';' => self.single(TokenKind::Semi),
                b',' => self.single(TokenKind::Comma),
                b'.' => self.single(TokenKind::Dot),
                _ => {
                    self.consume_unknown();
                    TokenKind::Error
                }
            };

            tokens.push(Token::new(kind, &self.source[start..self.index], line));
        }

        tokens
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char();
        kind
    }

    /// `single` when the next character is not `=`, `double` when it is.
    fn one_or_two(&mut self, single: TokenKind, double: TokenKind) -> TokenKind {
        self.consume_char();
        if self.peek_char() == Some(b'=') {
            self.consume_char();
            double
        } else {
            single
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == b'\n' {
                break;
            }
            self.consume_char();
        }
    }

    fn skip_block_comment(&mut self) {
        // Opening "/*"
        self.consume_char();
        self.consume_char();

        while let Some(ch) = self.peek_char() {
            if ch == b'*' && self.peek_next() == Some(b'/') {
                self.consume_char();
                self.consume_char();
                return;
            }
            if ch == b'\n' {
                self.line += 1;
            }
            self.consume_char();
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        self.consume_digits();

        if self.peek_char() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char(); // '.'
            self.consume_digits();
            TokenKind::DecimalLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn lex_string(&mut self, quote: u8) -> TokenKind {
        // Opening quote
        self.consume_char();

        while let Some(ch) = self.peek_char() {
            match ch {
                b'\\' if self.peek_next().is_some_and(|c| c != b'\n') => {
                    self.consume_char();
                    self.consume_char();
                }
                b'\n' => break,
                _ if ch == quote => {
                    self.consume_char();
                    break;
                }
                _ => self.consume_char(),
            }
        }

        TokenKind::StringLiteral
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> TokenKind {
        while self.peek_char().is_some_and(is_ident_continue) {
            self.consume_char();
        }

        match Keyword::lookup(&self.source[start..self.index]) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        }
    }

    /// Consume one whole (possibly multi-byte) character.
    fn consume_unknown(&mut self) {
        let width = self.source[self.index..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.index += width;
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if self.index < self.chars.len() {
            self.index += 1;
        }
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

// ---------------------------------------------------------------------
// Unterminated-construct pre-pass
// ---------------------------------------------------------------------

/// What a pre-pass sweep is looking for.
///
/// Both sweeps skip the constructs the other one checks, so quote
/// characters inside comments and comment markers inside strings are
/// never misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prescan {
    BlockComments,
    StringLiterals,
}

fn prescan(source: &str, mode: Prescan) -> Result<(), Diagnostic> {
    let bytes = source.as_bytes();
    let mut index = 0;
    let mut line = 1u32;

    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                line += 1;
                index += 1;
            }
            b'/' if bytes.get(index + 1) == Some(&b'/') => {
                while index < bytes.len() && bytes[index] != b'\n' {
                    index += 1;
                }
            }
            b'/' if bytes.get(index + 1) == Some(&b'*') => {
                match source[index + 2..].find("*/") {
                    Some(offset) => {
                        let end = index + 2 + offset + 2;
                        line += count_newlines(&bytes[index..end]);
                        index = end;
                    }
                    None if mode == Prescan::BlockComments => {
                        return Err(Diagnostic::lexical("unterminated block comment", line)
                            .with_detail(format!(
                                "the comment opened at line {line} is never closed with '*/'"
                            )));
                    }
                    None => index = bytes.len(),
                }
            }
            quote @ (b'"' | b'\'') => match scan_quoted(bytes, index, quote) {
                Ok(next) => index = next,
                Err(_) if mode == Prescan::StringLiterals => {
                    return Err(Diagnostic::lexical("unterminated string literal", line)
                        .with_detail(format!(
                            "the literal must be closed with {} before the end of the line",
                            quote as char
                        )));
                }
                Err(stop) => index = stop,
            },
            _ => index += 1,
        }
    }

    Ok(())
}

/// Scan a quoted literal starting at `start`.
///
/// `Ok` holds the index just past the closing quote; `Err` holds the
/// index of the newline (or end of input) where the literal broke.
fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> Result<usize, usize> {
    let mut index = start + 1;
    while let Some(&ch) = bytes.get(index) {
        match ch {
            b'\n' => return Err(index),
            b'\\' if bytes.get(index + 1).is_some_and(|&c| c != b'\n') => index += 2,
            _ if ch == quote => return Ok(index + 1),
            _ => index += 1,
        }
    }
    Err(bytes.len())
}

fn count_newlines(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn decimal_literal_is_one_token() {
        let tokens = tokenize("3.14").expect("tokenize");
        assert_eq!(tokens, vec![Token::new(TokenKind::DecimalLiteral, "3.14", 1)]);
    }

    #[test]
    fn trailing_dot_is_not_part_of_an_integer() {
        assert_eq!(kinds("3."), vec![TokenKind::IntLiteral, TokenKind::Dot]);
    }

    #[test]
    fn reserved_words_are_retagged() {
        assert_eq!(
            kinds("si sino siempre"),
            vec![
                TokenKind::Keyword(Keyword::If),
                TokenKind::Keyword(Keyword::Else),
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn comparisons_are_single_tokens() {
        assert_eq!(
            kinds("== != <= >= < > ="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn triple_equals_is_comparison_then_assign() {
        assert_eq!(kinds("==="), vec![TokenKind::EqEq, TokenKind::Assign]);
    }

    #[test]
    fn comments_are_skipped_and_lines_advance() {
        let tokens = tokenize("// header\n/* one\ntwo */ x\ny").expect("tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Ident, "x", 3),
                Token::new(TokenKind::Ident, "y", 4),
            ]
        );
    }

    #[test]
    fn strings_keep_quotes_and_escaped_quotes() {
        let tokens = tokenize(r#"cadena s = "di \"hola\""; 'it\'s'"#).expect("tokenize");
        assert_eq!(tokens[3].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[3].lexeme, r#""di \"hola\"""#);
        assert_eq!(tokens[5].lexeme, r"'it\'s'");
    }

    #[test]
    fn unterminated_block_comment_is_fatal_at_its_opening_line() {
        let err = tokenize("entero x = 1;\n/* comment\nentero y = 2;").unwrap_err();
        assert_eq!(err.message, "unterminated block comment");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unterminated_string_is_fatal_at_the_breaking_line() {
        let err = tokenize("entero x = 1;\ncadena s = \"unterminated\nentero y = 2;").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unterminated_string_at_end_of_input() {
        let err = tokenize("\n\ncadena s = 'abc").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn comment_markers_inside_strings_are_ignored() {
        let tokens = tokenize("cadena s = \"/* not a comment\";").expect("tokenize");
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn quotes_inside_comments_are_ignored() {
        assert!(tokenize("// don't\n/* it's */ x").is_ok());
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        let tokens = tokenize("x = 1 @ 2;\ny = ñ;").expect("tokenize");
        let errors = lexical_errors(&tokens);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "unexpected character '@'");
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[1].message, "unexpected character 'ñ'");
        assert_eq!(errors[1].line, 2);
    }

    #[test]
    fn lone_bang_is_an_error() {
        assert_eq!(kinds("!"), vec![TokenKind::Error]);
    }
}
