//! Rendering context shared by expressions and statements

use crate::dialect::Dialect;
use crate::scope::Scope;
use crate::value::Value;
use crate::Result;

/// SQL text plus its ordered bound arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub args: Vec<Value>,
    /// Statement to run first on the same connection, e.g. a session isolation level
    pub preamble: Option<String>,
    placeholders: usize,
}

impl RenderedSql {
    /// Number of parameter markers written while rendering; literals are not counted
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }
}

/// Accumulates SQL text and bound arguments in one pass.
///
/// Text and arguments are written together, so argument order always
/// follows placeholder order.
pub struct RenderContext<'a> {
    scope: &'a Scope,
    sql: String,
    args: Vec<Value>,
    /// Parameters bound ahead of this context in the same statement
    offset: usize,
    placeholders: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(scope: &'a Scope) -> Self {
        Self::starting_at(scope, 0)
    }

    fn starting_at(scope: &'a Scope, offset: usize) -> Self {
        Self {
            scope,
            sql: String::new(),
            args: Vec::new(),
            offset,
            placeholders: 0,
        }
    }

    fn next_index(&self) -> usize {
        self.offset + self.args.len() + 1
    }

    pub fn scope(&self) -> &'a Scope {
        self.scope
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.scope.dialect()
    }

    pub fn write(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Write a placeholder and record its argument
    pub fn bind(&mut self, value: Value) {
        let dialect = self.dialect();
        let kind = value.kind();
        self.sql.push_str(&dialect.parameter(kind, self.next_index()));
        self.placeholders += 1;
        let value = match dialect.type_adapter(kind) {
            Some(adapter) => adapter.to_database(value),
            None => value,
        };
        self.args.push(value);
    }

    /// Write a value inline
    pub fn literal(&mut self, value: &Value) -> Result<()> {
        let dialect = self.dialect();
        let sql = match dialect.type_adapter(value.kind()) {
            Some(adapter) => adapter.literal(dialect, value)?,
            None => dialect.literal(value)?,
        };
        self.sql.push_str(&sql);
        Ok(())
    }

    /// Write text rendered by child contexts, with the arguments they bound.
    ///
    /// Each argument must have been bound by exactly one marker in `sql`.
    pub fn write_with_args(&mut self, sql: &str, args: Vec<Value>) {
        self.sql.push_str(sql);
        self.placeholders += args.len();
        self.args.extend(args);
    }

    /// Empty context over the same scope, numbering parameters after this one's
    pub fn child(&self) -> RenderContext<'a> {
        self.child_after(0)
    }

    /// Like [`child`](Self::child), leaving room for `pending` parameters
    /// that will be written before the child's text
    pub fn child_after(&self, pending: usize) -> RenderContext<'a> {
        RenderContext::starting_at(self.scope, self.next_index() - 1 + pending)
    }

    /// Append a child context's text and arguments
    pub fn absorb(&mut self, other: RenderContext<'_>) {
        self.sql.push_str(&other.sql);
        self.placeholders += other.placeholders;
        self.args.extend(other.args);
    }

    /// Render `node` against a different scope into this context
    pub fn render_in<N: Render + ?Sized>(&mut self, scope: &Scope, node: &N) -> Result<()> {
        let mut inner = RenderContext::starting_at(scope, self.next_index() - 1);
        node.render(&mut inner)?;
        self.absorb(inner);
        Ok(())
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    pub fn finish(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            args: self.args,
            preamble: None,
            placeholders: self.placeholders,
        }
    }
}

/// Nodes that can be written into a [`RenderContext`]
pub trait Render {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()>;

    /// Render against `scope` on its own
    fn render_with(&self, scope: &Scope) -> Result<RenderedSql> {
        let mut ctx = RenderContext::new(scope);
        self.render(&mut ctx)?;
        Ok(ctx.finish())
    }
}
