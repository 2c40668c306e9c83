//! UTF-8-aware scanner: bytes → tokens with location and literal metadata
//! (§4.1).

mod token;

pub use token::*;

use std::iter::Peekable;
use std::str::CharIndices;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::source::{FileId, Span};

/// Scans one source file into a token stream. A run emits at most one
/// severity (warning or error) of overall outcome to its caller via
/// `had_error`; individual diagnostics are pushed to the sink as they are
/// discovered so a single run can surface several of them (§4.1 "Failure
/// semantics").
pub struct Lexer<'a> {
    file: FileId,
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    had_error: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(file: FileId, source: &'a str) -> Self {
        Self {
            file,
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            had_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_at(&mut self, n: usize) -> Option<char> {
        self.source[self.offset()..].chars().nth(n)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn here(&mut self) -> (usize, usize, usize) {
        (self.line, self.column, self.offset())
    }

    fn span_from(&mut self, start: (usize, usize, usize)) -> Span {
        let (line, column, offset) = start;
        let end_offset = self.offset();
        Span::new(self.file, line, column, offset, end_offset.saturating_sub(offset))
    }

    /// Scan the whole file into an ordered token sequence ending in
    /// exactly one `EOF` (§4.1 contract), plus whether any lexical error
    /// was reported during the run.
    pub fn lex(mut self, sink: &mut dyn DiagnosticSink) -> (Vec<Token>, bool) {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments(sink);

            let start = self.here();
            let Some(c) = self.peek() else {
                let span = self.span_from(start);
                if tokens.is_empty() {
                    sink.report(Diagnostic::warning("empty translation unit", span));
                }
                tokens.push(Token::new(TokenKind::Eof, "", span));
                break;
            };

            let token = match c {
                'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_like(start, sink),
                '0'..='9' => self.lex_number(start, sink),
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.lex_number(start, sink)
                }
                '"' => self.lex_string(start, StringKind::Managed, sink),
                '\'' => self.lex_char(start, CharKind::Unicode, sink),
                _ => self.lex_operator_or_unknown(start, sink),
            };

            if let Some(token) = token {
                tokens.push(token);
            }
        }

        (tokens, self.had_error)
    }

    fn skip_whitespace_and_comments(&mut self, sink: &mut dyn DiagnosticSink) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }

            if self.peek() == Some('/') && self.peek_at(1) == Some('/') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
                continue;
            }

            if self.peek() == Some('/') && self.peek_at(1) == Some('*') {
                let start = self.here();
                self.advance();
                self.advance();
                let mut depth = 1usize;
                while depth > 0 {
                    match (self.peek(), self.peek_at(1)) {
                        (Some('/'), Some('*')) => {
                            self.advance();
                            self.advance();
                            depth += 1;
                        }
                        (Some('*'), Some('/')) => {
                            self.advance();
                            self.advance();
                            depth -= 1;
                        }
                        (None, _) => {
                            sink.report(Diagnostic::warning(
                                "unterminated block comment",
                                self.span_from(start),
                            ));
                            break;
                        }
                        _ => {
                            self.advance();
                        }
                    }
                }
                continue;
            }

            break;
        }
    }

    fn lex_identifier_like(&mut self, start: (usize, usize, usize), sink: &mut dyn DiagnosticSink) -> Option<Token> {
        // A naked `b` immediately followed by a quote starts a byte-char
        // literal rather than an identifier (§4.1 edge cases).
        if self.peek() == Some('b') && self.peek_at(1) == Some('\'') {
            self.advance();
            return self.lex_char(start, CharKind::Byte, sink);
        }

        let mut lexeme = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            lexeme.push(self.advance().unwrap());
        }

        let span = self.span_from(start);
        let kind = match Keyword::lookup(&lexeme) {
            Some(Keyword::True) => TokenKind::Bool(true),
            Some(Keyword::False) => TokenKind::Bool(false),
            Some(k) => TokenKind::Keyword(k),
            None => TokenKind::Identifier(lexeme.clone()),
        };
        Some(Token::new(kind, lexeme, span))
    }

    fn lex_number(&mut self, start: (usize, usize, usize), sink: &mut dyn DiagnosticSink) -> Option<Token> {
        let (base, prefix_len) = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => (Base::Hex, 2),
            (Some('0'), Some('o' | 'O')) => (Base::Oct, 2),
            (Some('0'), Some('b' | 'B')) => (Base::Bin, 2),
            _ => (Base::Dec, 0),
        };

        let mut lexeme = String::new();
        for _ in 0..prefix_len {
            lexeme.push(self.advance().unwrap());
        }

        let is_digit = |c: char| match base {
            Base::Bin => c == '0' || c == '1',
            Base::Oct => ('0'..='7').contains(&c),
            Base::Dec => c.is_ascii_digit(),
            Base::Hex => c.is_ascii_hexdigit(),
        };

        let mut digits = String::new();
        while matches!(self.peek(), Some(c) if is_digit(c)) {
            let c = self.advance().unwrap();
            lexeme.push(c);
            digits.push(c);
        }

        let mut is_float = false;
        if base == Base::Dec && self.peek() == Some('.') && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
        {
            is_float = true;
            lexeme.push(self.advance().unwrap()); // '.'
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                let c = self.advance().unwrap();
                lexeme.push(c);
                digits.push(c);
            }
        } else if self.peek() == Some('.') && base != Base::Dec {
            // Non-decimal base with a fractional part is an error (§4.1).
            if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                let bad_start = self.here();
                self.advance();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                sink.report(Diagnostic::error(
                    "a non-decimal integer literal cannot have a fractional part",
                    self.span_from(bad_start),
                ));
                self.had_error = true;
            }
        }

        let modifier_start = self.here();
        let mut modifier = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            let c = self.advance().unwrap();
            lexeme.push(c);
            modifier.push(c);
        }

        let span = self.span_from(start);

        if is_float {
            let width = match modifier.as_str() {
                "" => FloatWidth::W64,
                "f32" => FloatWidth::W32,
                "f64" => FloatWidth::W64,
                _ => {
                    sink.report(Diagnostic::error(
                        format!("unknown float literal modifier '{modifier}'"),
                        self.span_from(modifier_start),
                    ));
                    self.had_error = true;
                    FloatWidth::W64
                }
            };
            let value: f64 = match digits.parse() {
                Ok(v) => v,
                Err(_) => {
                    sink.report(Diagnostic::error("float literal out of range", span));
                    self.had_error = true;
                    0.0
                }
            };
            return Some(Token::new(
                TokenKind::Float {
                    value,
                    meta: FloatLiteralMeta { width },
                },
                lexeme,
                span,
            ));
        }

        let (width, is_byte) = match modifier.as_str() {
            "" => (IntWidth::W32, false),
            "i8" => (IntWidth::W8, false),
            "i16" => (IntWidth::W16, false),
            "i32" => (IntWidth::W32, false),
            "i64" => (IntWidth::W64, false),
            "o" => (IntWidth::W8, true),
            _ => {
                sink.report(Diagnostic::error(
                    format!("unknown integer literal modifier '{modifier}'"),
                    self.span_from(modifier_start),
                ));
                self.had_error = true;
                (IntWidth::W32, false)
            }
        };

        let value = match u64::from_str_radix(&digits, base as u32) {
            Ok(v) => v,
            Err(_) => {
                sink.report(Diagnostic::error("integer literal out of range", span));
                self.had_error = true;
                0
            }
        };

        let max = match width {
            IntWidth::W8 => i8::MAX as u64,
            IntWidth::W16 => i16::MAX as u64,
            IntWidth::W32 => i32::MAX as u64,
            IntWidth::W64 => i64::MAX as u64,
        };
        if value > max {
            sink.report(Diagnostic::error(
                format!("integer literal {value} out of range for its width"),
                span,
            ));
            self.had_error = true;
        }

        Some(Token::new(
            TokenKind::Integer {
                value,
                meta: IntLiteralMeta {
                    width,
                    is_byte,
                    base,
                },
            },
            lexeme,
            span,
        ))
    }

    fn decode_escape(&mut self, sink: &mut dyn DiagnosticSink) -> Option<char> {
        let escape_start = self.here();
        let Some(c) = self.advance() else {
            return None;
        };
        Some(match c {
            '\\' => '\\',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'f' => '\u{000C}',
            'v' => '\u{000B}',
            'b' => '\u{0008}',
            'a' => '\u{0007}',
            '"' => '"',
            '\'' => '\'',
            'x' => {
                let mut digits = String::new();
                for _ in 0..2 {
                    if matches!(self.peek(), Some(d) if d.is_ascii_hexdigit()) {
                        digits.push(self.advance().unwrap());
                    }
                }
                let value = u8::from_str_radix(&digits, 16).unwrap_or(0);
                value as char
            }
            'o' => {
                let mut digits = String::new();
                for _ in 0..3 {
                    if matches!(self.peek(), Some(d) if ('0'..='7').contains(&d)) {
                        digits.push(self.advance().unwrap());
                    }
                }
                let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
                char::from_u32(value).unwrap_or('\u{0}')
            }
            other => {
                sink.report(Diagnostic::warning(
                    format!("unknown escape sequence '\\{other}'"),
                    self.span_from(escape_start),
                ));
                return None;
            }
        })
    }

    fn lex_string(
        &mut self,
        start: (usize, usize, usize),
        kind: StringKind,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Token> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    sink.report(Diagnostic::error("unterminated string literal", self.span_from(start)));
                    self.had_error = true;
                    break;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.decode_escape(sink) {
                        value.push(c);
                    }
                }
                Some(_) => value.push(self.advance().unwrap()),
            }
        }
        Some(Token::new(
            TokenKind::Str { value, kind },
            self.source[start.2..self.offset()].to_owned(),
            self.span_from(start),
        ))
    }

    fn lex_char(
        &mut self,
        start: (usize, usize, usize),
        kind: CharKind,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Token> {
        self.advance(); // opening quote
        let mut decoded: Vec<char> = Vec::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    sink.report(Diagnostic::error("unterminated character literal", self.span_from(start)));
                    self.had_error = true;
                    break;
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.decode_escape(sink) {
                        decoded.push(c);
                    }
                }
                Some(_) => decoded.push(self.advance().unwrap()),
            }
        }

        let span = self.span_from(start);
        if decoded.len() != 1 {
            sink.report(Diagnostic::error(
                "a character literal must decode to exactly one code point",
                span,
            ));
            self.had_error = true;
        }

        let value = decoded.first().copied().unwrap_or('\0');
        let value = if kind == CharKind::Byte { (value as u32) & 0xFF } else { value as u32 };

        Some(Token::new(
            TokenKind::Char { value, kind },
            self.source[start.2..self.offset()].to_owned(),
            span,
        ))
    }

    fn lex_operator_or_unknown(
        &mut self,
        start: (usize, usize, usize),
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Token> {
        if self.peek() == Some('c') && self.peek_at(1) == Some('"') {
            self.advance();
            return self.lex_string(start, StringKind::CString, sink);
        }

        let rest = &self.source[self.offset()..];
        for (lexeme, op) in Operator::TABLE {
            if rest.starts_with(lexeme) {
                for _ in lexeme.chars() {
                    self.advance();
                }
                return Some(Token::new(TokenKind::Operator(*op), *lexeme, self.span_from(start)));
            }
        }

        let bad = self.advance().unwrap();
        sink.report(Diagnostic::warning(
            format!("unrecognized character '{bad}'"),
            self.span_from(start),
        ));
        None
    }
}

/// Convenience entry point: lex a whole file, returning tokens regardless
/// of recoverable errors (the caller inspects the returned flag/the sink).
pub fn lex(file: FileId, source: &str, sink: &mut dyn DiagnosticSink) -> (Vec<Token>, bool) {
    Lexer::new(file, source).lex(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecSink;
    use crate::source::SourceCache;

    fn lex_str(src: &str) -> (Vec<Token>, VecSink) {
        let cache = SourceCache::new();
        let file = cache.insert("test.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = Lexer::new(file, src).lex(&mut sink);
        (tokens, sink)
    }

    #[test]
    fn lexes_identifiers_and_keywords() {
        let (tokens, sink) = lex_str("let mut x = 1;");
        assert!(!sink.has_errors());
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert!(matches!(kinds[0], TokenKind::Keyword(Keyword::Let)));
        assert!(matches!(kinds[1], TokenKind::Keyword(Keyword::Mut)));
        assert!(matches!(kinds[2], TokenKind::Identifier(n) if n == "x"));
        assert!(matches!(kinds[3], TokenKind::Operator(Operator::Assign)));
        assert!(matches!(kinds[4], TokenKind::Integer { value: 1, .. }));
        assert!(matches!(kinds[5], TokenKind::Operator(Operator::Semicolon)));
        assert!(matches!(kinds[6], TokenKind::Eof));
    }

    #[test]
    fn nested_block_comments() {
        let (tokens, sink) = lex_str("/* /* */ */ 1;");
        assert!(!sink.has_errors());
        assert!(matches!(tokens[0].kind, TokenKind::Integer { value: 1, .. }));
    }

    #[test]
    fn hex_and_modifier_suffix() {
        let (tokens, sink) = lex_str("0xFFi64");
        assert!(!sink.has_errors());
        let TokenKind::Integer { value, meta } = &tokens[0].kind else {
            panic!("expected integer");
        };
        assert_eq!(*value, 255);
        assert_eq!(meta.width, IntWidth::W64);
        assert_eq!(meta.base, Base::Hex);
    }

    #[test]
    fn leading_dot_float() {
        let (tokens, sink) = lex_str(".5");
        assert!(!sink.has_errors());
        assert!(matches!(tokens[0].kind, TokenKind::Float { .. }));
    }

    #[test]
    fn float_default_width_is_64() {
        let (tokens, _) = lex_str("3.5");
        let TokenKind::Float { meta, .. } = &tokens[0].kind else {
            panic!("expected float");
        };
        assert_eq!(meta.width, FloatWidth::W64);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (_, sink) = lex_str("\"abc");
        assert!(sink.has_errors());
    }

    #[test]
    fn unknown_integer_modifier_is_an_error() {
        let (_, sink) = lex_str("12zz");
        assert!(sink.has_errors());
    }

    #[test]
    fn integer_at_max_is_accepted_max_plus_one_is_rejected() {
        let (_, sink) = lex_str("127i8");
        assert!(!sink.has_errors());
        let (_, sink) = lex_str("128i8");
        assert!(sink.has_errors());
    }

    #[test]
    fn multi_codepoint_char_literal_is_rejected() {
        let (_, sink) = lex_str("'ab'");
        assert!(sink.has_errors());
    }

    #[test]
    fn c_string_and_byte_char() {
        let (tokens, sink) = lex_str("c\"hi\" b'a'");
        assert!(!sink.has_errors());
        assert!(matches!(
            tokens[0].kind,
            TokenKind::Str {
                kind: StringKind::CString,
                ..
            }
        ));
        assert!(matches!(
            tokens[1].kind,
            TokenKind::Char {
                kind: CharKind::Byte,
                ..
            }
        ));
    }

    #[test]
    fn unrecognized_character_is_a_warning_and_lexing_continues() {
        let (tokens, sink) = lex_str("1 @ 2;");
        assert!(!sink.has_errors());
        assert!(matches!(tokens[0].kind, TokenKind::Integer { value: 1, .. }));
        assert!(matches!(tokens[1].kind, TokenKind::Integer { value: 2, .. }));
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let (tokens, sink) = lex_str("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
        assert!(
            sink.diagnostics.iter().any(|d| d.message.contains("empty translation unit")),
            "expected an empty-translation-unit warning, got: {:#?}",
            sink.diagnostics
        );
    }

    #[test]
    fn longest_match_operators() {
        let (tokens, _) = lex_str("-> += == <=");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert!(matches!(kinds[0], TokenKind::Operator(Operator::Arrow)));
        assert!(matches!(kinds[1], TokenKind::Operator(Operator::PlusAssign)));
        assert!(matches!(kinds[2], TokenKind::Operator(Operator::EqEq)));
        assert!(matches!(kinds[3], TokenKind::Operator(Operator::LtEq)));
    }
}
