use std::iter::Peekable;
use std::str::CharIndices;

use crate::shell::error::LexError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Word,
    And,
    Or,
    Pipe,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    fn word(value: String) -> Self {
        Self {
            kind: TokenKind::Word,
            value,
        }
    }

    fn operator(kind: TokenKind, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Splits a whole line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

pub struct Lexer<'a> {
    input: Peekable<CharIndices<'a>>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.char_indices().peekable(),
            source: input,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Ok(None);
        };
        let token = match c {
            '&' if self.at_double('&') => {
                self.read_char();
                self.read_char();
                Token::operator(TokenKind::And, "&&")
            }
            '|' if self.at_double('|') => {
                self.read_char();
                self.read_char();
                Token::operator(TokenKind::Or, "||")
            }
            '|' => {
                self.read_char();
                Token::operator(TokenKind::Pipe, "|")
            }
            '"' | '\'' => self.read_quoted_string()?,
            _ => self.read_word(),
        };
        Ok(Some(token))
    }

    fn read_char(&mut self) -> Option<(usize, char)> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().map(|&(_, c)| c)
    }

    fn position(&mut self) -> usize {
        self.input
            .peek()
            .map(|&(pos, _)| pos)
            .unwrap_or(self.source.len())
    }

    /// True when the next two characters are both `c`.
    fn at_double(&mut self, c: char) -> bool {
        let pos = self.position();
        let mut rest = self.source[pos..].chars();
        rest.next() == Some(c) && rest.next() == Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c != ' ' && c != '\t' {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '|' || (c == '&' && self.at_double('&')) {
                break;
            }
            if let Some((_, c)) = self.read_char() {
                word.push(c);
            }
        }

        Token::word(word)
    }

    fn read_quoted_string(&mut self) -> Result<Token, LexError> {
        let Some((column, quote)) = self.read_char() else {
            return Ok(Token::word(String::new()));
        };
        let mut string = String::new();

        while let Some((_, c)) = self.read_char() {
            if c == quote {
                return Ok(Token::word(string));
            }
            string.push(c);
        }

        Err(LexError::UnterminatedQuote { quote, column })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let tokens = tokenize("echo hello world").unwrap();
        assert_eq!(values(&tokens), vec!["echo", "hello", "world"]);
        assert!(tokens.iter().all(Token::is_word));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_operators() {
        let tokens = tokenize("a && b || c | d").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Word,
                TokenKind::And,
                TokenKind::Word,
                TokenKind::Or,
                TokenKind::Word,
                TokenKind::Pipe,
                TokenKind::Word,
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_operators_without_spaces() {
        let tokens = tokenize("ps|grep ssh&&echo ok||echo fail").unwrap();
        assert_eq!(
            values(&tokens),
            vec!["ps", "|", "grep", "ssh", "&&", "echo", "ok", "||", "echo", "fail"]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_strings() {
        let tokens = tokenize(r#"echo "a b" 'foo  bar'"#).unwrap();
        assert_eq!(values(&tokens), vec!["echo", "a b", "foo  bar"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quotes_keep_operators_and_backslashes() {
        let tokens = tokenize(r#"echo "x && y | z" 'a\'"#).unwrap();
        assert_eq!(values(&tokens), vec!["echo", "x && y | z", "a\\"]);
        assert!(tokens.iter().all(Token::is_word));
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            tokenize("echo \"oops"),
            Err(LexError::UnterminatedQuote {
                quote: '"',
                column: 5
            })
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_lone_ampersand_is_word_text() {
        let tokens = tokenize("sleep 1 & a&b").unwrap();
        assert_eq!(values(&tokens), vec!["sleep", "1", "&", "a&b"]);
        assert!(tokens.iter().all(Token::is_word));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirect_words_and_tabs() {
        let tokens = tokenize("cat\t<in >out").unwrap();
        assert_eq!(values(&tokens), vec!["cat", "<in", ">out"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_mid_word_quote_is_literal() {
        let tokens = tokenize("a\"b c").unwrap();
        assert_eq!(values(&tokens), vec!["a\"b", "c"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_line() {
        assert!(tokenize("  \t ").unwrap().is_empty());
    }
}
