//! Lexer and parser for type expressions in program files.
//!
//! ```text
//! type       := NAME ('<' argument (',' argument)* '>')?
//! argument   := '?' | type
//! type_param := NAME ('extends' type)?
//! ```

use std::ops::Range;

use logos::Logos;

use crate::dispatch::TypeParam;
use crate::types::{DeclaredType, PrimitiveKind, TypeEnv};

use super::LoadError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token(",")]
    Comma,
    #[token("?")]
    Question,
    #[token("extends")]
    Extends,
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*")]
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Tokenize a type expression; spans are relative to `text`.
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, Range<usize>> {
    let mut lexer = TokenKind::lexer(text);
    let mut tokens = Vec::new();
    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        match kind {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice(),
                span,
            }),
            Err(()) => return Err(span),
        }
    }
    Ok(tokens)
}

/// Parses the type expressions of one declaration.
///
/// Names resolve, in order, to primitives, `void`, type parameters in scope,
/// and reference types registered in the environment.
pub struct TypeParser<'a> {
    env: &'a TypeEnv,
    scope: Vec<TypeParam>,
}

struct Cursor<'t, 's> {
    tokens: &'t [Token<'s>],
    pos: usize,
    /// Span of the whole expression in the program file.
    span: Range<usize>,
    text: &'s str,
}

impl<'t, 's> Cursor<'t, 's> {
    fn peek(&self) -> Option<&'t Token<'s>> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'t Token<'s>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().map(|t| t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> LoadError {
        LoadError::Syntax {
            message: format!("{} in `{}`", message.into(), self.text),
            span: self.span.clone(),
        }
    }

    fn finish(&self) -> Result<(), LoadError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected `{}`", token.text))),
        }
    }
}

impl<'a> TypeParser<'a> {
    pub fn new(env: &'a TypeEnv) -> Self {
        Self {
            env,
            scope: Vec::new(),
        }
    }

    /// Type parameters declared so far.
    pub fn type_params(&self) -> &[TypeParam] {
        &self.scope
    }

    /// Parse a type parameter declaration and bring it into scope.
    ///
    /// A bound may mention the parameter itself, which is then seen at the
    /// root type.
    pub fn declare_type_param(&mut self, text: &str, span: Range<usize>) -> Result<TypeParam, LoadError> {
        let tokens = tokenize(text).map_err(|_| syntax(text, span.clone()))?;
        let mut cursor = Cursor { tokens: &tokens, pos: 0, span, text };

        let name = match cursor.bump() {
            Some(token) if token.kind == TokenKind::Name => token.text.to_string(),
            _ => return Err(cursor.error("expected a type parameter name")),
        };
        if self.scope.iter().any(|p| p.name == name) {
            return Err(cursor.error(format!("type parameter `{}` is declared twice", name)));
        }

        let root = DeclaredType::named(self.env.root());
        let bound = if cursor.eat(TokenKind::Extends) {
            self.scope.push(TypeParam {
                name: name.clone(),
                bound: root.clone(),
            });
            let bound = self.parse_type(&mut cursor);
            self.scope.pop();
            bound?
        } else {
            root
        };
        cursor.finish()?;

        let param = TypeParam { name, bound };
        self.scope.push(param.clone());
        Ok(param)
    }

    /// Parse a parameter or return type expression.
    pub fn parse(&self, text: &str, span: Range<usize>) -> Result<DeclaredType, LoadError> {
        let tokens = tokenize(text).map_err(|_| syntax(text, span.clone()))?;
        let mut cursor = Cursor { tokens: &tokens, pos: 0, span, text };
        let ty = self.parse_type(&mut cursor)?;
        cursor.finish()?;
        Ok(ty)
    }

    fn parse_type(&self, cursor: &mut Cursor<'_, '_>) -> Result<DeclaredType, LoadError> {
        let name = match cursor.bump() {
            Some(token) if token.kind == TokenKind::Name => token.text,
            Some(token) => return Err(cursor.error(format!("expected a type, found `{}`", token.text))),
            None => return Err(cursor.error("expected a type")),
        };

        let mut args = Vec::new();
        if cursor.eat(TokenKind::LAngle) {
            loop {
                if cursor.eat(TokenKind::Question) {
                    if cursor.peek().map(|t| t.kind) == Some(TokenKind::Extends) {
                        return Err(cursor.error("bounded wildcards are not supported"));
                    }
                    args.push(DeclaredType::Wildcard);
                } else {
                    args.push(self.parse_type(cursor)?);
                }
                if cursor.eat(TokenKind::Comma) {
                    continue;
                }
                if cursor.eat(TokenKind::RAngle) {
                    break;
                }
                return Err(cursor.error("expected `,` or `>`"));
            }
        }

        self.resolve(name, args, cursor)
    }

    fn resolve(
        &self,
        name: &str,
        args: Vec<DeclaredType>,
        cursor: &Cursor<'_, '_>,
    ) -> Result<DeclaredType, LoadError> {
        let simple = if let Some(kind) = PrimitiveKind::from_name(name) {
            Some(DeclaredType::Primitive(kind))
        } else if name == "void" {
            Some(DeclaredType::Void)
        } else {
            self.scope.iter().rev().find(|p| p.name == name).map(|p| DeclaredType::TypeVar {
                name: p.name.clone(),
                bound: Box::new(p.bound.clone()),
            })
        };

        if let Some(ty) = simple {
            if !args.is_empty() {
                return Err(cursor.error(format!("`{}` does not take type arguments", name)));
            }
            return Ok(ty);
        }

        match self.env.lookup(name) {
            Some(id) => Ok(DeclaredType::Declared { id, args }),
            None => Err(LoadError::UnknownType {
                name: name.to_string(),
                span: cursor.span.clone(),
            }),
        }
    }
}

fn syntax(text: &str, span: Range<usize>) -> LoadError {
    LoadError::Syntax {
        message: format!("invalid character in `{}`", text),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize() {
        use TokenKind::*;
        assert_eq!(
            kinds("Map<String, ? >"),
            vec![Name, LAngle, Name, Comma, Question, RAngle]
        );
        assert_eq!(kinds("T extends java.lang.Number"), vec![Name, Extends, Name]);
        assert_eq!(kinds("extendsFoo"), vec![Name]);
        assert!(tokenize("List[]").is_err());
    }

    #[test]
    fn test_parse_simple_types() {
        let env = TypeEnv::java_prelude();
        let parser = TypeParser::new(&env);
        assert_eq!(parser.parse("int", 0..3).unwrap(), DeclaredType::Primitive(PrimitiveKind::Int));
        assert_eq!(parser.parse("void", 0..4).unwrap(), DeclaredType::Void);
        assert_eq!(
            parser.parse("String", 0..6).unwrap(),
            DeclaredType::named(env.lookup("String").unwrap())
        );
    }

    #[test]
    fn test_parse_generic_types() {
        let env = TypeEnv::java_prelude();
        let parser = TypeParser::new(&env);
        let ty = parser.parse("Map<String, List<?>>", 0..20).unwrap();
        assert_eq!(env.describe_declared(&ty), "Map<String, List<?>>");
        assert!(!ty.is_reifiable());
        assert!(parser.parse("List<?>", 0..7).unwrap().is_reifiable());
    }

    #[test]
    fn test_type_params() {
        let env = TypeEnv::java_prelude();
        let mut parser = TypeParser::new(&env);
        parser.declare_type_param("T extends Comparable<T>", 0..23).unwrap();
        parser.declare_type_param("U", 0..1).unwrap();

        let t = parser.parse("T", 0..1).unwrap();
        assert_eq!(
            t.erasure(&env),
            Some(crate::types::ParameterType::Reference(env.lookup("Comparable").unwrap()))
        );
        assert!(!t.is_reifiable());
        assert_eq!(parser.parse("U", 0..1).unwrap().erasure(&env), Some(crate::types::ParameterType::Top));
        assert_eq!(parser.type_params().len(), 2);
        assert!(parser.declare_type_param("U", 0..1).is_err());
    }

    #[test]
    fn test_parse_errors() {
        let env = TypeEnv::java_prelude();
        let parser = TypeParser::new(&env);
        assert!(matches!(parser.parse("Shape", 4..9), Err(LoadError::UnknownType { span, .. }) if span == (4..9)));
        assert!(matches!(parser.parse("int<String>", 0..11), Err(LoadError::Syntax { .. })));
        assert!(matches!(parser.parse("List<String", 0..11), Err(LoadError::Syntax { .. })));
        assert!(matches!(parser.parse("List<? extends Number>", 0..22), Err(LoadError::Syntax { .. })));
        assert!(matches!(parser.parse("String String", 0..13), Err(LoadError::Syntax { .. })));
        assert!(matches!(parser.parse("", 0..0), Err(LoadError::Syntax { .. })));
    }
}
