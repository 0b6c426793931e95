//! Recursive-descent parser: tokens → `Schema`.
//!
//! ```text
//! start      := request response*
//! request    := method ('/'? method)* route json_type?
//! route      := (static_segment route_var?)*
//! route_var  := '<' type ':' ident '>' | '<' ident '>'
//! response   := status ('/'? status)* json_type?
//! json_type  := object | array
//! object     := '{' (kv ','?)* ('...' )? '}'
//! array      := '[' (value ','?)* ('...')? ']'
//! value      := (type | json_type) '*'?
//! type       := scalar ('(' integer ')')?     -- bound only on `string`
//! ```

use indexmap::IndexMap;

use crate::ast::{
    ArrayType, Method, ObjectType, Request, ResponseCase, Route, RouteSegment, RouteVar,
    ScalarType, Schema, Shape, StatusMatcher, TypeNode,
};
use crate::error::{CompileError, GrammarError};
use crate::lexer::{Token, TokenKind};
use crate::validate::DEFAULT_MAX_DEPTH;

// ------------------------------- Policy ---------------------------------- //

/// Containers nested deeper than this are rejected at compile time.
pub const MAX_NESTING: usize = DEFAULT_MAX_DEPTH;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

type PResult<T> = Result<T, GrammarError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, nesting: 0 }
    }

    pub fn parse(mut self) -> PResult<Schema> {
        let request = self.request()?;
        let mut responses = Vec::new();
        while !self.at_end() {
            responses.push(self.response()?);
        }
        Ok(Schema { request, responses })
    }

    // ---------------------------- cursor ---------------------------------- //

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn advance(&mut self) -> PResult<&Token> {
        let token = self.tokens.get(self.pos).ok_or(GrammarError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    /// Consume `kind` if it is next.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_is(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<()> {
        let token = self.advance()?;
        if &token.kind == kind { Ok(()) } else { Err(unexpected(token)) }
    }

    fn line_here(&self) -> Option<usize> {
        self.tokens.get(self.pos).map(|t| t.line)
    }

    fn error_here(&self) -> GrammarError {
        match self.tokens.get(self.pos) {
            Some(token) => unexpected(token),
            None => GrammarError::UnexpectedEof,
        }
    }

    // ---------------------------- request --------------------------------- //

    fn request(&mut self) -> PResult<Request> {
        let methods = self.methods()?;
        let route = self.route()?;
        let schema = self.maybe_json_type()?;
        Ok(Request { methods, route, schema })
    }

    fn methods(&mut self) -> PResult<Vec<Method>> {
        let mut methods = vec![self.method()?];
        loop {
            if self.eat(&TokenKind::Slash) {
                methods.push(self.method()?);
            } else if let Some(TokenKind::Method(m)) = self.peek() {
                methods.push(*m);
                self.pos += 1;
            } else {
                return Ok(methods);
            }
        }
    }

    fn method(&mut self) -> PResult<Method> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Method(m) => Ok(m),
            _ => Err(unexpected(token)),
        }
    }

    fn route(&mut self) -> PResult<Route> {
        let mut segments = Vec::new();
        while let Some(TokenKind::StaticRoute(seg)) = self.peek() {
            segments.push(RouteSegment::Static(seg.clone()));
            self.pos += 1;
            if self.eat(&TokenKind::Lt) {
                segments.push(RouteSegment::Var(self.route_var()?));
            }
        }
        Ok(Route { segments })
    }

    /// Body of `<...>` after the opening `<`.
    fn route_var(&mut self) -> PResult<RouteVar> {
        let ty = if matches!(self.peek(), Some(TokenKind::Type(_))) {
            let ty = self.scalar()?;
            self.expect(&TokenKind::Colon)?;
            Some(ty)
        } else {
            None
        };
        let name = self.ident()?;
        self.expect(&TokenKind::Gt)?;
        Ok(RouteVar { name, ty })
    }

    fn ident(&mut self) -> PResult<String> {
        let token = self.advance()?;
        match &token.kind {
            TokenKind::Ident(name) => Ok(name.clone()),
            _ => Err(unexpected(token)),
        }
    }

    // ---------------------------- responses ------------------------------- //

    /// Bare juxtaposition only joins statuses on the same line; a line break
    /// without `/` closes the case.
    fn response(&mut self) -> PResult<ResponseCase> {
        let mut line = self.line_here();
        let mut matchers = vec![self.status()?];
        loop {
            if self.eat(&TokenKind::Slash) {
                line = self.line_here();
                matchers.push(self.status()?);
            } else if matches!(self.peek(), Some(TokenKind::Integer(_) | TokenKind::StatusMatcher(_)))
                && self.line_here() == line
            {
                matchers.push(self.status()?);
            } else {
                break;
            }
        }
        let schema = self.maybe_json_type()?;
        Ok(ResponseCase { matchers, schema })
    }

    fn status(&mut self) -> PResult<StatusMatcher> {
        let token = self.advance()?;
        match &token.kind {
            TokenKind::Integer(n) => u16::try_from(*n)
                .ok()
                .filter(|code| *code <= 999)
                .map(StatusMatcher::Literal)
                .ok_or_else(|| unexpected(token)),
            TokenKind::StatusMatcher(p) => Ok(StatusMatcher::Pattern(p.clone())),
            _ => Err(unexpected(token)),
        }
    }

    // ---------------------------- json types ------------------------------ //

    fn maybe_json_type(&mut self) -> PResult<Option<TypeNode>> {
        match self.peek() {
            Some(TokenKind::LBrace | TokenKind::LBracket) => self.json_type().map(Some),
            _ => Ok(None),
        }
    }

    fn json_type(&mut self) -> PResult<TypeNode> {
        if self.nesting >= MAX_NESTING {
            let line = self.line_here().unwrap_or_default();
            return Err(GrammarError::NestingTooDeep { line });
        }
        self.nesting += 1;
        let shape = match self.peek() {
            Some(TokenKind::LBrace) => self.object().map(Shape::Object),
            Some(TokenKind::LBracket) => self.array().map(Shape::Array),
            _ => Err(self.error_here()),
        };
        self.nesting -= 1;
        Ok(TypeNode::new(shape?))
    }

    fn object(&mut self) -> PResult<ObjectType> {
        self.expect(&TokenKind::LBrace)?;
        let mut fields = IndexMap::new();
        let mut allow_extra_keys = false;
        loop {
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            if self.eat(&TokenKind::Ellipsis) {
                allow_extra_keys = true;
                self.expect(&TokenKind::RBrace)?;
                break;
            }
            let token = self.advance()?;
            let (key, line) = match &token.kind {
                TokenKind::Str(key) => (key.clone(), token.line),
                _ => return Err(unexpected(token)),
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.value()?;
            if fields.insert(key.clone(), value).is_some() {
                return Err(GrammarError::DuplicateKey { key, line });
            }
            self.eat(&TokenKind::Comma);
        }
        Ok(ObjectType { fields, allow_extra_keys })
    }

    fn array(&mut self) -> PResult<ArrayType> {
        self.expect(&TokenKind::LBracket)?;
        let mut items = Vec::new();
        let mut repeating = false;
        loop {
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            if self.peek_is(&TokenKind::Ellipsis) {
                if items.is_empty() {
                    return Err(self.error_here());
                }
                self.pos += 1;
                repeating = true;
                self.expect(&TokenKind::RBracket)?;
                break;
            }
            items.push(self.value()?);
            self.eat(&TokenKind::Comma);
        }
        Ok(ArrayType { items, repeating })
    }

    fn value(&mut self) -> PResult<TypeNode> {
        let node = match self.peek() {
            Some(TokenKind::LBrace | TokenKind::LBracket) => self.json_type()?,
            Some(TokenKind::Type(_)) => TypeNode::scalar(self.scalar()?),
            _ => return Err(self.error_here()),
        };
        Ok(if self.eat(&TokenKind::Star) { node.nullable() } else { node })
    }

    fn scalar(&mut self) -> PResult<ScalarType> {
        let token = self.advance()?;
        let ty = match token.kind {
            TokenKind::Type(ty) => ty,
            _ => return Err(unexpected(token)),
        };
        if !matches!(ty, ScalarType::String { .. }) || !self.eat(&TokenKind::LParen) {
            return Ok(ty);
        }
        let token = self.advance()?;
        let max_len = match token.kind {
            TokenKind::Integer(n) => u64::try_from(n).map_err(|_| unexpected(token))?,
            _ => return Err(unexpected(token)),
        };
        self.expect(&TokenKind::RParen)?;
        Ok(ScalarType::String { max_len: Some(max_len) })
    }
}

fn unexpected(token: &Token) -> GrammarError {
    GrammarError::Unexpected { token: token.kind.to_string(), line: token.line }
}

/// Lex and parse bare DSL source (no surrounding documentation).
pub fn parse_schema(src: &str) -> Result<Schema, CompileError> {
    let tokens = crate::lexer::tokenize(src)?;
    let schema = Parser::new(tokens).parse()?;
    tracing::debug!(
        route = %schema.request.route.template(),
        responses = schema.responses.len(),
        "compiled schema"
    );
    Ok(schema)
}
