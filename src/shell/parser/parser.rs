use log::debug;

use super::ast::{CommandUnit, NextOp, Segment};
use super::lexer::{tokenize, Token, TokenKind};
use crate::shell::error::{ParseError, ShellError};
use crate::shell::executor::variable;

/// Tokenizes and parses one input line.
pub fn parse_line(line: &str) -> Result<Vec<Segment>, ShellError> {
    let tokens = tokenize(line)?;
    debug!("词法分析结果: {:?}", tokens);
    let segments = Parser::new(&tokens).parse_segments()?;
    debug!("解析后的命令段: {:?}", segments);
    Ok(segments)
}

pub struct Parser<'a> {
    tokens: &'a [Token],
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens }
    }

    /// Splits the tokens at `&&` / `||` into segments.
    pub fn parse_segments(&self) -> Result<Vec<Segment>, ParseError> {
        let mut segments = Vec::new();
        let mut start = 0;

        loop {
            let end = self.tokens[start..]
                .iter()
                .position(|t| matches!(t.kind, TokenKind::And | TokenKind::Or))
                .map_or(self.tokens.len(), |offset| start + offset);

            let pipeline = parse_pipeline(&self.tokens[start..end])?;
            let next_op = match self.tokens.get(end).map(|t| t.kind) {
                Some(TokenKind::And) => NextOp::And,
                Some(TokenKind::Or) => NextOp::Or,
                _ => NextOp::None,
            };
            segments.push(Segment { pipeline, next_op });

            if next_op == NextOp::None {
                break;
            }
            start = end + 1;
        }

        Ok(segments)
    }
}

/// Splits one segment's tokens on `|` into command units.
pub fn parse_pipeline(tokens: &[Token]) -> Result<Vec<CommandUnit>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptySegment);
    }

    tokens
        .split(|t| t.kind == TokenKind::Pipe)
        .map(|group| {
            if group.is_empty() {
                Err(ParseError::EmptyPipelineCommand)
            } else {
                parse_command_unit(group)
            }
        })
        .collect()
}

/// Collects arguments and redirects of a single command.
pub fn parse_command_unit(tokens: &[Token]) -> Result<CommandUnit, ParseError> {
    let mut command = CommandUnit::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if !token.is_word() {
            return Err(ParseError::UnexpectedToken(token.value.clone()));
        }
        let word = token.value.as_str();

        match word {
            ">" | "<" => {
                let operator = if word == ">" { '>' } else { '<' };
                let target = iter
                    .next()
                    .map(|t| t.value.clone())
                    .ok_or(ParseError::MissingRedirectTarget(operator))?;
                set_redirect(&mut command, word, target);
            }
            _ if word.len() > 1 && (word.starts_with('>') || word.starts_with('<')) => {
                set_redirect(&mut command, &word[..1], word[1..].to_string());
            }
            _ => command.args.push(variable::expand(word)),
        }
    }

    if command.args.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(command)
}

fn set_redirect(command: &mut CommandUnit, operator: &str, target: String) {
    if operator == ">" {
        command.stdout_path = Some(target);
    } else {
        command.stdin_path = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse(line: &str) -> Result<Vec<Segment>, ParseError> {
        Parser::new(&tokenize(line).unwrap()).parse_segments()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let segments = parse("ls -l").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].next_op, NextOp::None);
        assert_eq!(segments[0].pipeline.len(), 1);
        assert_eq!(segments[0].pipeline[0].args, vec!["ls", "-l"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let segments = parse("ps | grep ssh | wc -l").unwrap();
        let pipeline = &segments[0].pipeline;
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0].program(), "ps");
        assert_eq!(pipeline[1].arguments(), ["ssh"]);
        assert_eq!(pipeline[2].args, vec!["wc", "-l"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_chain_operators() {
        let segments = parse("a && b | c || d").unwrap();
        let ops: Vec<NextOp> = segments.iter().map(|s| s.next_op).collect();
        assert_eq!(ops, vec![NextOp::And, NextOp::Or, NextOp::None]);
        assert_eq!(segments[1].pipeline.len(), 2);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_forms() {
        let unit = &parse("cmd < in > out").unwrap()[0].pipeline[0];
        assert_eq!(unit.args, vec!["cmd"]);
        assert_eq!(unit.stdin_path.as_deref(), Some("in"));
        assert_eq!(unit.stdout_path.as_deref(), Some("out"));

        let unit = &parse("sort <data.txt >sorted.txt -r").unwrap()[0].pipeline[0];
        assert_eq!(unit.args, vec!["sort", "-r"]);
        assert_eq!(unit.stdin_path.as_deref(), Some("data.txt"));
        assert_eq!(unit.stdout_path.as_deref(), Some("sorted.txt"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_expansion_skips_redirect_targets() {
        std::env::set_var("TINYSH_PARSER_TEST", "value");
        let unit = &parse("echo $TINYSH_PARSER_TEST >$TINYSH_PARSER_TEST").unwrap()[0].pipeline[0];
        assert_eq!(unit.args, vec!["echo", "value"]);
        assert_eq!(unit.stdout_path.as_deref(), Some("$TINYSH_PARSER_TEST"));
    }

    #[test]
    fn test_empty_pipeline_command() {
        assert_eq!(parse("a | | b"), Err(ParseError::EmptyPipelineCommand));
        assert_eq!(parse("| a"), Err(ParseError::EmptyPipelineCommand));
        assert_eq!(parse("a |"), Err(ParseError::EmptyPipelineCommand));
    }

    #[test]
    fn test_empty_segment() {
        assert_eq!(parse("&& a"), Err(ParseError::EmptySegment));
        assert_eq!(parse("a && || b"), Err(ParseError::EmptySegment));
        assert_eq!(parse("a &&"), Err(ParseError::EmptySegment));
    }

    #[test]
    fn test_redirect_errors() {
        assert_eq!(parse("cat >"), Err(ParseError::MissingRedirectTarget('>')));
        assert_eq!(parse("cat <"), Err(ParseError::MissingRedirectTarget('<')));
        assert_eq!(parse("> out"), Err(ParseError::EmptyCommand));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_parse_line_reports_lex_errors() {
        let err = parse_line("echo 'open").unwrap_err();
        assert!(matches!(err, ShellError::Lex(_)));
        let err = parse_line("a | | b").unwrap_err();
        assert!(matches!(err, ShellError::Parse(ParseError::EmptyPipelineCommand)));
    }
}
