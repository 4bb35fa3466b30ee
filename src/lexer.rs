//! Lexical Analyzer
//!
//! Construct a [`Lexer`] over the source text and call [`Lexer::next_token`]
//! repeatedly until it returns a token of kind [`TokenKind::Eof`]. The lexer
//! keeps no token buffer; the parser holds its single lookahead token itself.

use phf::phf_map;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
	// Keywords
	Int,
	Float,
	Char,
	Void,
	If,
	Else,
	While,
	For,
	Return,

	Identifier,
	IntegerLiteral,
	FloatLiteral,
	CharLiteral,
	StringLiteral,

	// Operators
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Assign,
	EqualEqual,
	NotEqual,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	AndAnd,
	OrOr,
	Bang,

	// Punctuation
	LeftParen,
	RightParen,
	LeftBrace,
	RightBrace,
	Semicolon,
	Comma,

	Eof,
	Error,
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
	"int" => TokenKind::Int,
	"float" => TokenKind::Float,
	"char" => TokenKind::Char,
	"void" => TokenKind::Void,
	"if" => TokenKind::If,
	"else" => TokenKind::Else,
	"while" => TokenKind::While,
	"for" => TokenKind::For,
	"return" => TokenKind::Return,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub text: String,
	pub line: usize,
	pub column: usize,
}

impl Token {
	fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
		Self {
			kind,
			text: text.into(),
			line,
			column,
		}
	}
}

/// Scans the source byte by byte. Positions are 1-based; newlines bump the
/// line and reset the column, every other consumed byte bumps the column.
pub struct Lexer<'a> {
	source: &'a [u8],
	pos: usize,
	line: usize,
	column: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source: source.as_bytes(),
			pos: 0,
			line: 1,
			column: 1,
		}
	}

	fn bump(&mut self) {
		self.pos += 1;
		self.column += 1;
	}

	fn skip_whitespace(&mut self) {
		while let Some(&byte) = self.source.get(self.pos) {
			match byte {
				b' ' | b'\t' | b'\r' => self.bump(),
				b'\n' => {
					self.pos += 1;
					self.line += 1;
					self.column = 1;
				}
				_ => break,
			}
		}
	}

	/// Greedy run of digits and decimal points. More than one dot is accepted
	/// as part of a single token; any dot marks the token as a float literal.
	fn number(&mut self, line: usize, column: usize) -> Token {
		let start = self.pos;
		let mut is_float = false;
		while let Some(&byte) = self.source.get(self.pos) {
			if byte == b'.' {
				is_float = true;
			} else if !byte.is_ascii_digit() {
				break;
			}
			self.bump();
		}
		let kind = if is_float {
			TokenKind::FloatLiteral
		} else {
			TokenKind::IntegerLiteral
		};
		Token::new(kind, self.text_from(start), line, column)
	}

	fn identifier_or_keyword(&mut self, line: usize, column: usize) -> Token {
		let start = self.pos;
		while let Some(&byte) = self.source.get(self.pos) {
			if !byte.is_ascii_alphanumeric() && byte != b'_' {
				break;
			}
			self.bump();
		}
		let text = self.text_from(start);
		let kind = KEYWORDS
			.get(text.as_str())
			.copied()
			.unwrap_or(TokenKind::Identifier);
		Token::new(kind, text, line, column)
	}

	/// String and character literals keep their delimiters in the token text.
	/// A backslash skips the following byte as an opaque two-byte unit; no
	/// escape decoding happens here.
	fn quoted(&mut self, delimiter: u8, kind: TokenKind, line: usize, column: usize) -> Token {
		let start = self.pos;
		self.bump();
		while let Some(&byte) = self.source.get(self.pos) {
			if byte == delimiter {
				break;
			}
			if byte == b'\\' {
				self.bump();
			}
			self.bump();
		}
		if self.pos < self.source.len() {
			self.bump();
		}
		Token::new(kind, self.text_from(start), line, column)
	}

	fn text_from(&self, start: usize) -> String {
		// A trailing backslash in an unterminated literal can leave `pos`
		// one past the end
		let end = self.pos.min(self.source.len());
		String::from_utf8_lossy(&self.source[start..end]).into_owned()
	}

	pub fn next_token(&mut self) -> Token {
		self.skip_whitespace();

		let (line, column) = (self.line, self.column);
		let Some(&byte) = self.source.get(self.pos) else {
			return Token::new(TokenKind::Eof, "EOF", line, column);
		};

		if byte.is_ascii_alphabetic() || byte == b'_' {
			return self.identifier_or_keyword(line, column);
		}
		if byte.is_ascii_digit() {
			return self.number(line, column);
		}
		if byte == b'"' {
			return self.quoted(b'"', TokenKind::StringLiteral, line, column);
		}
		if byte == b'\'' {
			return self.quoted(b'\'', TokenKind::CharLiteral, line, column);
		}

		// Two-character operators, matched by lookahead before the
		// single-character fallbacks below.
		if let Some(&next) = self.source.get(self.pos + 1) {
			let two_char = match (byte, next) {
				(b'=', b'=') => Some(TokenKind::EqualEqual),
				(b'!', b'=') => Some(TokenKind::NotEqual),
				(b'<', b'=') => Some(TokenKind::LessEqual),
				(b'>', b'=') => Some(TokenKind::GreaterEqual),
				(b'&', b'&') => Some(TokenKind::AndAnd),
				(b'|', b'|') => Some(TokenKind::OrOr),
				_ => None,
			};
			if let Some(kind) = two_char {
				self.bump();
				self.bump();
				let text = self.text_from(self.pos - 2);
				return Token::new(kind, text, line, column);
			}
		}

		self.bump();
		let kind = match byte {
			b'+' => TokenKind::Plus,
			b'-' => TokenKind::Minus,
			b'*' => TokenKind::Star,
			b'/' => TokenKind::Slash,
			b'%' => TokenKind::Percent,
			b'=' => TokenKind::Assign,
			b'<' => TokenKind::Less,
			b'>' => TokenKind::Greater,
			b'!' => TokenKind::Bang,
			b'(' => TokenKind::LeftParen,
			b')' => TokenKind::RightParen,
			b'{' => TokenKind::LeftBrace,
			b'}' => TokenKind::RightBrace,
			b';' => TokenKind::Semicolon,
			b',' => TokenKind::Comma,
			_ => TokenKind::Error,
		};
		Token::new(kind, (byte as char).to_string(), line, column)
	}
}

mod test {
	#[allow(unused_imports)]
	use super::*;

	#[allow(dead_code)]
	fn kinds(source: &str) -> Vec<TokenKind> {
		let mut lexer = Lexer::new(source);
		let mut kinds = Vec::new();
		loop {
			let token = lexer.next_token();
			let kind = token.kind;
			kinds.push(kind);
			if kind == TokenKind::Eof {
				return kinds;
			}
		}
	}

	#[test]
	fn two_char_operators_are_not_split() {
		use TokenKind::*;
		assert_eq!(
			kinds("== != <= >= && ||"),
			vec![EqualEqual, NotEqual, LessEqual, GreaterEqual, AndAnd, OrOr, Eof]
		);
		assert_eq!(kinds("a<=b"), vec![Identifier, LessEqual, Identifier, Eof]);
		assert_eq!(kinds("= =="), vec![Assign, EqualEqual, Eof]);
	}

	#[test]
	fn keywords_reclassify_identifiers() {
		use TokenKind::*;
		assert_eq!(
			kinds("int float char void if else while for return"),
			vec![Int, Float, Char, Void, If, Else, While, For, Return, Eof]
		);
		// Near-keywords stay generic identifiers
		assert_eq!(
			kinds("integer iff returns"),
			vec![Identifier, Identifier, Identifier, Eof]
		);
	}

	#[test]
	fn positions() {
		let mut lexer = Lexer::new("int x;\ny = 1;");
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Int, "int", 1, 1));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Identifier, "x", 1, 5));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Semicolon, ";", 1, 6));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Identifier, "y", 2, 1));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Assign, "=", 2, 3));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::IntegerLiteral, "1", 2, 5));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Semicolon, ";", 2, 6));
		assert_eq!(lexer.next_token(), Token::new(TokenKind::Eof, "EOF", 2, 7));
	}

	#[test]
	fn numbers() {
		let mut lexer = Lexer::new("42 3.14 1.2.3");
		assert_eq!(lexer.next_token().kind, TokenKind::IntegerLiteral);
		let pi = lexer.next_token();
		assert_eq!((pi.kind, pi.text.as_str()), (TokenKind::FloatLiteral, "3.14"));
		// Multiple dots are scanned as one (float) token, not validated
		let odd = lexer.next_token();
		assert_eq!((odd.kind, odd.text.as_str()), (TokenKind::FloatLiteral, "1.2.3"));
	}

	#[test]
	fn quoted_literals_keep_delimiters() {
		let mut lexer = Lexer::new(r#""hi \"there\"" 'a' '\n'"#);
		let string = lexer.next_token();
		assert_eq!(string.kind, TokenKind::StringLiteral);
		assert_eq!(string.text, r#""hi \"there\"""#);
		let ch = lexer.next_token();
		assert_eq!((ch.kind, ch.text.as_str()), (TokenKind::CharLiteral, "'a'"));
		let escaped = lexer.next_token();
		assert_eq!((escaped.kind, escaped.text.as_str()), (TokenKind::CharLiteral, r"'\n'"));
	}

	#[test]
	fn unrecognized_characters_become_error_tokens() {
		let mut lexer = Lexer::new("@");
		let token = lexer.next_token();
		assert_eq!((token.kind, token.text.as_str()), (TokenKind::Error, "@"));
		assert_eq!(lexer.next_token().kind, TokenKind::Eof);
	}

	#[test]
	fn eof_is_repeatable() {
		let mut lexer = Lexer::new("x");
		assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
		assert_eq!(lexer.next_token().kind, TokenKind::Eof);
		assert_eq!(lexer.next_token().kind, TokenKind::Eof);
	}
}
