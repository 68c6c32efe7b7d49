//! Labeled select lists

use std::sync::Arc;

use crate::expr::{AliasRef, ColumnRef, ColumnTarget, Expr};
use crate::render::{Render, RenderContext};
use crate::scope::AliasInfo;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ProjectionItem {
    pub expr: Expr,
    pub label: String,
}

/// Ordered `expr as label` list with unique labels
#[derive(Debug, Clone, Default)]
pub struct Projection {
    items: Vec<ProjectionItem>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every column of `alias`, labeled `{alias}_{column}`.
    ///
    /// Column names are unique per table and derived labels per projection,
    /// so these labels are unique too; rendering checks it again.
    pub fn of_alias(alias: &Arc<AliasInfo>) -> Projection {
        let items = alias
            .column_names()
            .into_iter()
            .map(|column| ProjectionItem {
                label: format!("{}_{}", alias.name(), column),
                expr: Expr::Column(ColumnRef {
                    alias: AliasRef::Bound(Arc::clone(alias)),
                    target: ColumnTarget::Name(column),
                }),
            })
            .collect();
        Projection { items }
    }

    pub fn push(&mut self, expr: Expr, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        if self.items.iter().any(|item| item.label == label) {
            return Err(Error::label_collision(label));
        }
        self.items.push(ProjectionItem { expr, label });
        Ok(())
    }

    pub fn extend(&mut self, other: Projection) -> Result<()> {
        for item in other.items {
            self.push(item.expr, item.label)?;
        }
        Ok(())
    }

    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|item| item.label.clone()).collect()
    }

    pub fn items(&self) -> &[ProjectionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Render for Projection {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        for (i, item) in self.items.iter().enumerate() {
            if self.items[..i].iter().any(|earlier| earlier.label == item.label) {
                return Err(Error::label_collision(item.label.clone()));
            }
            if i > 0 {
                ctx.write(", ");
            }
            item.expr.render(ctx)?;
            ctx.write(" as ");
            ctx.write(&item.label);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Table;
    use crate::database::Database;
    use crate::scope::Scope;
    use crate::value::Value;

    #[derive(serde::Deserialize)]
    #[allow(dead_code)]
    struct Widget {
        widget_id: i64,
        name: String,
    }

    #[test]
    fn test_alias_projection_labels() {
        let mut builder = Table::<Widget>::builder("WIDGET");
        builder.column::<i64>("WIDGET_ID");
        builder.column::<String>("NAME");
        let w = builder.build().alias("w");

        let projection = Projection::of_alias(w.info());
        assert_eq!(projection.labels(), vec!["w_WIDGET_ID", "w_NAME"]);

        let scope = Scope::of(Database::builder().build(), Arc::clone(w.info()));
        assert_eq!(
            projection.render_with(&scope).unwrap().sql,
            "w.WIDGET_ID as w_WIDGET_ID, w.NAME as w_NAME"
        );
    }

    #[test]
    fn test_label_collision() {
        let mut projection = Projection::new();
        projection.push(Expr::Value(Value::I32(1)), "x").unwrap();
        let err = projection.push(Expr::Value(Value::I32(2)), "x").unwrap_err();
        assert!(matches!(err, Error::LabelCollision { .. }));
        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn test_render_rejects_repeated_labels() {
        let mut first = Projection::new();
        first.push(Expr::Value(Value::I32(1)), "x").unwrap();
        let mut doubled = first.clone();
        doubled.items.extend(first.items.iter().cloned());

        let scope = Scope::new(Database::builder().build());
        let err = doubled.render_with(&scope).unwrap_err();
        assert!(matches!(err, Error::LabelCollision { .. }));
    }
}
