use crate::ast::{Expr, ExprKind, Stmt};
use crate::error::{Error, Result};
use crate::token::{Keyword, Token, TokenKind};

/// One slot of the parse stack: a shifted token or a reduced fragment.
#[derive(Debug)]
enum Item {
    Tok(Token),
    Expr(Expr),
    Stmt(Stmt),
    Args(Vec<Expr>),
}

const EOF_KIND: TokenKind = TokenKind::Eof;

fn item_at<'a>(stack: &'a [Item], from_top: usize) -> Option<&'a Item> {
    let index = stack.len().checked_sub(from_top + 1)?;
    stack.get(index)
}

fn tok_kind<'a>(stack: &'a [Item], from_top: usize) -> Option<&'a TokenKind> {
    match item_at(stack, from_top) {
        Some(Item::Tok(token)) => Some(&token.kind),
        _ => None,
    }
}

fn is_expr(stack: &[Item], from_top: usize) -> bool {
    matches!(item_at(stack, from_top), Some(Item::Expr(_)))
}

fn is_field_expr(stack: &[Item], from_top: usize) -> bool {
    matches!(
        item_at(stack, from_top),
        Some(Item::Expr(Expr {
            kind: ExprKind::Field(_),
            ..
        }))
    )
}

fn is_stmt(stack: &[Item], from_top: usize) -> bool {
    matches!(item_at(stack, from_top), Some(Item::Stmt(_)))
}

fn is_args(stack: &[Item], from_top: usize) -> bool {
    matches!(item_at(stack, from_top), Some(Item::Args(_)))
}

fn pop_token(stack: &mut Vec<Item>) -> Token {
    match stack.pop() {
        Some(Item::Tok(token)) => token,
        _ => unreachable!(),
    }
}

fn pop_expr(stack: &mut Vec<Item>) -> Expr {
    match stack.pop() {
        Some(Item::Expr(expr)) => expr,
        _ => unreachable!(),
    }
}

fn pop_stmt(stack: &mut Vec<Item>) -> Stmt {
    match stack.pop() {
        Some(Item::Stmt(stmt)) => stmt,
        _ => unreachable!(),
    }
}

/// Attempts every reduction once, in priority order. Returns whether one
/// fired; the caller loops to a fixed point after each shift.
fn reduce(stack: &mut Vec<Item>, lookahead: &TokenKind) -> bool {
    // literal -> expr
    if let Some(TokenKind::Number(_)) = tok_kind(stack, 0) {
        let token = pop_token(stack);
        if let TokenKind::Number(value) = token.kind {
            stack.push(Item::Expr(Expr::new(
                ExprKind::Number(value),
                token.row,
                token.col,
            )));
        }
        return true;
    }

    // identifier -> expr, unless an argument list follows
    if *lookahead != TokenKind::LParen {
        if let Some(TokenKind::Field(_)) = tok_kind(stack, 0) {
            let token = pop_token(stack);
            if let TokenKind::Field(name) = token.kind {
                stack.push(Item::Expr(Expr::new(
                    ExprKind::Field(name),
                    token.row,
                    token.col,
                )));
            }
            return true;
        }
    }

    // argument list accumulation, once the argument cannot grow further
    if is_expr(stack, 0)
        && tok_kind(stack, 1) == Some(&TokenKind::Comma)
        && !matches!(lookahead, TokenKind::Operator(_) | TokenKind::LParen)
    {
        if is_args(stack, 2) {
            let expr = pop_expr(stack);
            pop_token(stack);
            if let Some(Item::Args(args)) = stack.last_mut() {
                args.push(expr);
            }
            return true;
        }
        if is_expr(stack, 2) {
            let second = pop_expr(stack);
            pop_token(stack);
            let first = pop_expr(stack);
            stack.push(Item::Args(vec![first, second]));
            return true;
        }
    }

    // call
    if tok_kind(stack, 0) == Some(&TokenKind::RParen)
        && (is_expr(stack, 1) || is_args(stack, 1))
        && tok_kind(stack, 2) == Some(&TokenKind::LParen)
        && matches!(tok_kind(stack, 3), Some(TokenKind::Field(_)))
    {
        pop_token(stack); // )
        let args = match stack.pop() {
            Some(Item::Expr(expr)) => vec![expr],
            Some(Item::Args(args)) => args,
            _ => unreachable!(),
        };
        pop_token(stack); // (
        let token = pop_token(stack);
        if let TokenKind::Field(name) = token.kind {
            stack.push(Item::Expr(Expr::new(
                ExprKind::Call { name, args },
                token.row,
                token.col,
            )));
        }
        return true;
    }

    // parenthesized expression
    if tok_kind(stack, 0) == Some(&TokenKind::RParen)
        && is_expr(stack, 1)
        && tok_kind(stack, 2) == Some(&TokenKind::LParen)
    {
        pop_token(stack);
        let expr = pop_expr(stack);
        pop_token(stack);
        stack.push(Item::Expr(expr));
        return true;
    }

    // binary expression, unless a tighter operator follows
    if is_expr(stack, 0) && is_expr(stack, 2) {
        if let Some(TokenKind::Operator(op)) = tok_kind(stack, 1) {
            let op = *op;
            let next_binds_tighter = match lookahead {
                TokenKind::Operator(next) => next.precedence() > op.precedence(),
                _ => false,
            };
            if !next_binds_tighter {
                let rhs = pop_expr(stack);
                pop_token(stack);
                let lhs = pop_expr(stack);
                let (row, col) = (lhs.row, lhs.col);
                stack.push(Item::Expr(Expr::new(
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    row,
                    col,
                )));
                return true;
            }
        }
    }

    // assignment -> statement, once the value cannot grow further
    if is_expr(stack, 0)
        && tok_kind(stack, 1) == Some(&TokenKind::Assign)
        && is_field_expr(stack, 2)
        && !matches!(lookahead, TokenKind::Operator(_) | TokenKind::LParen)
    {
        let value = pop_expr(stack);
        pop_token(stack);
        let target = pop_expr(stack);
        if let ExprKind::Field(name) = target.kind {
            stack.push(Item::Stmt(Stmt::Assign {
                name,
                value,
                row: target.row,
                col: target.col,
            }));
        }
        return true;
    }

    // consecutive separators collapse
    if tok_kind(stack, 0) == Some(&TokenKind::Eol) && tok_kind(stack, 1) == Some(&TokenKind::Eol) {
        pop_token(stack);
        return true;
    }

    // a separator directly before `end` is dropped
    if tok_kind(stack, 0) == Some(&TokenKind::Keyword(Keyword::End))
        && tok_kind(stack, 1) == Some(&TokenKind::Eol)
        && is_stmt(stack, 2)
    {
        let end = pop_token(stack);
        pop_token(stack);
        stack.push(Item::Tok(end));
        return true;
    }

    // if ... end / while ... end
    if tok_kind(stack, 0) == Some(&TokenKind::Keyword(Keyword::End))
        && is_stmt(stack, 1)
        && tok_kind(stack, 2) == Some(&TokenKind::Eol)
        && is_expr(stack, 3)
    {
        let head = match tok_kind(stack, 4) {
            Some(TokenKind::Keyword(Keyword::If)) => Some(Keyword::If),
            Some(TokenKind::Keyword(Keyword::While)) => Some(Keyword::While),
            _ => None,
        };
        if let Some(keyword) = head {
            pop_token(stack); // end
            let body = Box::new(pop_stmt(stack));
            pop_token(stack); // separator
            let cond = pop_expr(stack);
            pop_token(stack); // if / while
            let stmt = if keyword == Keyword::If {
                Stmt::If { cond, body }
            } else {
                Stmt::While { cond, body }
            };
            stack.push(Item::Stmt(stmt));
            return true;
        }
    }

    // statement concatenation
    if is_stmt(stack, 0) && tok_kind(stack, 1) == Some(&TokenKind::Eol) && is_stmt(stack, 2) {
        let second = pop_stmt(stack);
        pop_token(stack);
        let first = pop_stmt(stack);
        let stmt = match first {
            Stmt::Seq(mut stmts) => {
                stmts.push(second);
                Stmt::Seq(stmts)
            }
            first => Stmt::Seq(vec![first, second]),
        };
        stack.push(Item::Stmt(stmt));
        return true;
    }

    false
}

fn syntax_error(stack: &[Item], tokens: &[Token]) -> Error {
    for item in stack {
        if let Item::Tok(token) = item {
            return Error::new(token.row, token.col, "syntax error".to_string());
        }
    }
    for item in stack {
        match item {
            Item::Expr(expr) => return Error::new(expr.row, expr.col, "syntax error".to_string()),
            Item::Args(args) => {
                if let Some(first) = args.first() {
                    return Error::new(first.row, first.col, "syntax error".to_string());
                }
            }
            _ => {}
        }
    }

    let (row, col) = tokens.last().map(|t| (t.row, t.col)).unwrap_or((1, 1));
    Error::new(row, col, "syntax error".to_string())
}

/// Bottom-up shift/reduce parse: shift one token, then run the reduction
/// rules to a fixed point. After all input is consumed, leading and
/// trailing separators are trimmed and exactly one statement must remain.
pub fn parse(tokens: &[Token]) -> Result<Stmt> {
    let mut stack: Vec<Item> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            break;
        }

        stack.push(Item::Tok(token.clone()));
        let lookahead = tokens
            .get(index + 1)
            .map(|next| &next.kind)
            .unwrap_or(&EOF_KIND);
        while reduce(&mut stack, lookahead) {}
    }

    while matches!(stack.last(), Some(Item::Tok(token)) if token.kind == TokenKind::Eol) {
        stack.pop();
    }
    while matches!(stack.first(), Some(Item::Tok(token)) if token.kind == TokenKind::Eol) {
        stack.remove(0);
    }

    if stack.is_empty() {
        return Err(Error::new(1, 1, "empty program".to_string()));
    }

    if stack.len() == 1 && is_stmt(&stack, 0) {
        return Ok(pop_stmt(&mut stack));
    }

    Err(syntax_error(&stack, tokens))
}
