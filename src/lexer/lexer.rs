use regex::Regex;

use crate::{
    diagnostics::diagnostics::{Diagnostic, DiagnosticKind},
    Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

pub struct Lexer {
    patterns: Vec<RegexPattern>,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    source: String,
    pos: usize,
    line: u32,
    line_start: usize,
    pending_doc: Option<String>,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            pos: 0,
            line: 1,
            line_start: 0,
            tokens: vec![],
            diagnostics: vec![],
            pending_doc: None,
            patterns: vec![
                RegexPattern { regex: Regex::new("\\r?\\n").unwrap(), handler: newline_handler },
                RegexPattern { regex: Regex::new("[ \\t]+").unwrap(), handler: skip_handler },
                RegexPattern { regex: Regex::new("//[^\\n]*").unwrap(), handler: line_comment_handler },
                RegexPattern { regex: Regex::new("/\\*").unwrap(), handler: block_comment_handler },
                RegexPattern { regex: Regex::new("[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
                RegexPattern { regex: Regex::new("[0-9]+(\\.[0-9]+)?").unwrap(), handler: number_handler },
                RegexPattern { regex: Regex::new("\"").unwrap(), handler: string_handler },
                RegexPattern { regex: Regex::new("@").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::At, "@") },
                RegexPattern { regex: Regex::new("\\|>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Pipe, "|>") },
                RegexPattern { regex: Regex::new("->").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->") },
                RegexPattern { regex: Regex::new("=>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::FatArrow, "=>") },
                RegexPattern { regex: Regex::new("==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "==") },
                RegexPattern { regex: Regex::new("!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=") },
                RegexPattern { regex: Regex::new("<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=") },
                RegexPattern { regex: Regex::new(">=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=") },
                RegexPattern { regex: Regex::new("\\?\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::QuestionDot, "?.") },
                RegexPattern { regex: Regex::new("=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=") },
                RegexPattern { regex: Regex::new("<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
                RegexPattern { regex: Regex::new(">").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
                RegexPattern { regex: Regex::new("\\[").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[") },
                RegexPattern { regex: Regex::new("\\]").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]") },
                RegexPattern { regex: Regex::new("\\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
                RegexPattern { regex: Regex::new("\\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
                RegexPattern { regex: Regex::new("\\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
                RegexPattern { regex: Regex::new("\\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
                RegexPattern { regex: Regex::new("\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dot, ".") },
                RegexPattern { regex: Regex::new(";").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
                RegexPattern { regex: Regex::new(":").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
                RegexPattern { regex: Regex::new("\\?").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Question, "?") },
                RegexPattern { regex: Regex::new(",").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
                RegexPattern { regex: Regex::new("\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+") },
                RegexPattern { regex: Regex::new("-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dash, "-") },
                RegexPattern { regex: Regex::new("/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Slash, "/") },
                RegexPattern { regex: Regex::new("\\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Star, "*") },
                RegexPattern { regex: Regex::new("%").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Percent, "%") },
            ],
            source: source.to_string(),
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    /// Pushes a token, attaching any pending doc-comment text to it. Implicit
    /// terminators never absorb a doc comment; it waits for the real token.
    pub fn push(&mut self, mut token: Token) {
        if !matches!(token.kind, TokenKind::Newline | TokenKind::EOF) {
            if let Some(doc) = self.pending_doc.take() {
                token.doc = Some(doc);
            }
        }
        self.tokens.push(token);
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span) {
        self.diagnostics.push(Diagnostic::new(kind, span));
    }

    pub fn at(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Span for a token of `len` bytes starting at the current position.
    pub fn span_here(&self, len: usize) -> Span {
        Span::new(self.pos, self.pos + len, self.line, self.column())
    }

    pub fn column(&self) -> u32 {
        (self.pos - self.line_start) as u32 + 1
    }

    fn mark_newline(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    /// Skips forward to the next whitespace or terminator boundary so later
    /// tokens are still produced after a lexical error.
    fn skip_to_boundary(&mut self) {
        while let Some(c) = self.at() {
            if c.is_whitespace() || matches!(c, ';' | ',' | ')' | ']' | '}') {
                break;
            }
            self.advance_n(c.len_utf8());
        }
    }

    fn last_token_ends_statement(&self) -> bool {
        self.tokens
            .last()
            .map(|t| t.kind.ends_statement())
            .unwrap_or(false)
    }
}

fn newline_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(1);

    if lexer.last_token_ends_statement() {
        let span = lexer.span_here(len);
        lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\n"), span));
    }

    lexer.advance_n(len);
    lexer.mark_newline();
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().end();
    lexer.advance_n(matched);
}

fn line_comment_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().as_str().to_string();

    if let Some(doc_line) = matched.strip_prefix("///") {
        let doc_line = doc_line.trim();
        if let Some(doc) = &mut lexer.pending_doc {
            doc.push('\n');
            doc.push_str(doc_line);
        } else {
            lexer.pending_doc = Some(doc_line.to_string());
        }
    }

    lexer.advance_n(matched.len());
}

fn block_comment_handler(lexer: &mut Lexer, _regex: &Regex) {
    let start_span = lexer.span_here(2);
    lexer.advance_n(2);

    loop {
        if lexer.at_eof() {
            lexer.report(DiagnosticKind::UnterminatedComment, start_span);
            return;
        }
        if lexer.remainder().starts_with("*/") {
            lexer.advance_n(2);
            return;
        }
        let c = lexer.at().unwrap();
        lexer.advance_n(c.len_utf8());
        if c == '\n' {
            lexer.mark_newline();
        }
    }
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = regex.find(lexer.remainder()).unwrap().as_str().to_string();
    let span = lexer.span_here(value.len());

    if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        lexer.push(MK_TOKEN!(*kind, value.clone(), span));
    } else {
        lexer.push(MK_TOKEN!(TokenKind::Identifier, value.clone(), span));
    }

    lexer.advance_n(value.len());
}

const DURATION_UNITS: [&str; 5] = ["ms", "s", "m", "h", "d"];

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().as_str().to_string();
    let is_float = matched.contains('.');
    let after = lexer.remainder()[matched.len()..].to_string();

    // Integer immediately followed by a unit suffix is a duration literal.
    if !is_float {
        for unit in DURATION_UNITS {
            let boundary = after
                .strip_prefix(unit)
                .map(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(false);
            if boundary {
                let value = format!("{}{}", matched, unit);
                let span = lexer.span_here(value.len());
                lexer.push(MK_TOKEN!(TokenKind::Duration, value.clone(), span));
                lexer.advance_n(value.len());
                return;
            }
        }
    }

    // Any other trailing identifier character makes the literal malformed:
    // report it and resynchronize at the next boundary.
    if after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        let span = lexer.span_here(matched.len());
        lexer.advance_n(matched.len());
        lexer.skip_to_boundary();
        let literal = lexer.source[span.start..lexer.pos].to_string();
        lexer.report(DiagnosticKind::MalformedNumber { literal }, span);
        return;
    }

    let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
    let span = lexer.span_here(matched.len());
    lexer.push(MK_TOKEN!(kind, matched.clone(), span));
    lexer.advance_n(matched.len());
}

fn string_handler(lexer: &mut Lexer, _regex: &Regex) {
    let start = lexer.pos;
    let start_line = lexer.line;
    let start_column = lexer.column();
    lexer.advance_n(1);

    let mut value = String::new();
    loop {
        match lexer.at() {
            None | Some('\n') => {
                let span = Span::new(start, lexer.pos, start_line, start_column);
                lexer.report(DiagnosticKind::UnterminatedString, span);
                lexer.push(MK_TOKEN!(TokenKind::String, value.clone(), span));
                return;
            }
            Some('"') => {
                lexer.advance_n(1);
                break;
            }
            Some('\\') => {
                lexer.advance_n(1);
                match lexer.at() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('x') => {
                        lexer.advance_n(1);
                        let mut hex = String::new();
                        for _ in 0..2 {
                            if let Some(c) = lexer.at() {
                                if c.is_ascii_hexdigit() {
                                    hex.push(c);
                                    lexer.advance_n(1);
                                }
                            }
                        }
                        match u8::from_str_radix(&hex, 16) {
                            Ok(byte) => value.push(byte as char),
                            Err(_) => {
                                let span = lexer.span_here(1);
                                lexer.report(DiagnosticKind::InvalidEscape { escape: 'x' }, span);
                            }
                        }
                        continue;
                    }
                    Some(other) => {
                        let span = lexer.span_here(1);
                        lexer.report(DiagnosticKind::InvalidEscape { escape: other }, span);
                        value.push(other);
                    }
                    None => continue,
                }
                lexer.advance_n(1);
            }
            Some(c) => {
                value.push(c);
                lexer.advance_n(c.len_utf8());
            }
        }
    }

    let span = Span::new(start, lexer.pos, start_line, start_column);
    lexer.push(MK_TOKEN!(TokenKind::String, value.clone(), span));
}

/// Tokenizes the entire input, always producing a token stream that covers
/// it (ending in EOF) plus whatever lexical diagnostics were collected.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lex = Lexer::new(source);

    while !lex.at_eof() {
        let mut matched = false;

        for i in 0..lex.patterns.len() {
            let matches_here = lex.patterns[i]
                .regex
                .find(lex.remainder())
                .map(|m| m.start() == 0)
                .unwrap_or(false);

            if matches_here {
                let handler = lex.patterns[i].handler;
                let regex = lex.patterns[i].regex.clone();
                handler(&mut lex, &regex);
                matched = true;
                break;
            }
        }

        if !matched {
            let c = lex.at().unwrap();
            let span = lex.span_here(c.len_utf8());
            lex.report(DiagnosticKind::UnrecognisedToken { token: c.to_string() }, span);
            lex.skip_to_boundary();
        }
    }

    let span = lex.span_here(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));

    (lex.tokens, lex.diagnostics)
}
