use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, QueryFilter, Select, Value as DbValue,
    sea_query::{Alias, Expr, SimpleExpr},
};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use super::handlers::HandlerRegistry;
use crate::{options::Filters, resource::CrudResource};

/// `null`, whitespace-only strings and empty arrays never produce a predicate.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(values) => values.is_empty(),
        _ => false,
    }
}

/// Column reference for `field`; bare names are qualified with `alias`.
#[must_use]
pub fn qualified_column(alias: &str, field: &str) -> SimpleExpr {
    match field.split_once('.') {
        Some((table, column)) => Expr::col((Alias::new(table), Alias::new(column))).into(),
        None => Expr::col((Alias::new(alias), Alias::new(field))).into(),
    }
}

/// Whether `field` names a column of `R`'s entity declared as a UUID.
///
/// Dotted names and names that are not entity columns are never UUID columns.
#[must_use]
pub fn is_uuid_column<R: CrudResource>(field: &str) -> bool {
    <<R::Entity as EntityTrait>::Column as FromStr>::from_str(field)
        .is_ok_and(|column| matches!(column.def().get_column_type(), ColumnType::Uuid))
}

/// Convert a JSON scalar to a bound value. Strings bind as UUIDs only on UUID columns.
fn scalar_value(value: &Value, uuid_column: bool) -> Option<DbValue> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            match Uuid::parse_str(trimmed) {
                Ok(uuid) if uuid_column => Some(DbValue::from(uuid)),
                _ => Some(DbValue::from(trimmed)),
            }
        }
        Value::Number(number) => number
            .as_i64()
            .map(DbValue::from)
            .or_else(|| number.as_f64().map(DbValue::from)),
        Value::Bool(b) => Some(DbValue::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Equality for scalars, `IN` for arrays; `None` for values that cannot be expressed.
fn build_condition(column: SimpleExpr, value: &Value, uuid_column: bool) -> Option<SimpleExpr> {
    match value {
        Value::Array(values) => {
            let in_values: Vec<DbValue> = values
                .iter()
                .filter_map(|v| scalar_value(v, uuid_column))
                .collect();
            if in_values.is_empty() {
                return None;
            }
            Some(Expr::expr(column).is_in(in_values))
        }
        Value::Object(_) => None,
        scalar => scalar_value(scalar, uuid_column).map(|v| Expr::expr(column).eq(v)),
    }
}

/// AND one predicate per filter onto `select`, in insertion order.
///
/// A custom handler registered under the field name gets the raw value, blank or not.
/// Blank values and fields outside [`CrudResource::filterable_fields`] are skipped.
pub fn apply_filters<R: CrudResource>(
    mut select: Select<R::Entity>,
    filters: &Filters,
    handlers: &HandlerRegistry<R::Entity>,
) -> Select<R::Entity> {
    let alias = R::alias();
    let filterable = R::filterable_fields();

    for (field, value) in filters {
        if let Some(handler) = handlers.filter_handler(field) {
            select = handler(select, value);
            continue;
        }

        if is_blank(value) {
            continue;
        }

        if !filterable.contains(&field.as_str()) {
            tracing::debug!(
                resource = R::ENTITY_NAME,
                field = %field,
                "Ignoring filter on a field that is not filterable"
            );
            continue;
        }

        let uuid_column = is_uuid_column::<R>(field);
        match build_condition(qualified_column(&alias, field), value, uuid_column) {
            Some(condition) => select = select.filter(condition),
            None => tracing::debug!(
                resource = R::ENTITY_NAME,
                field = %field,
                "Ignoring filter value that cannot be compared"
            ),
        }
    }

    select
}
