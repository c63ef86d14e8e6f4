use sea_orm::{QueryOrder, Select};

use super::{conditions::qualified_column, handlers::HandlerRegistry};
use crate::{
    options::{SortOrder, Sorting},
    resource::CrudResource,
};

fn order_by<R: CrudResource>(
    select: Select<R::Entity>,
    alias: &str,
    field: &str,
    order: SortOrder,
    handlers: &HandlerRegistry<R::Entity>,
) -> Select<R::Entity> {
    match handlers.sort_handler(field) {
        Some(handler) => handler(select, order),
        None => select.order_by(qualified_column(alias, field), order.into()),
    }
}

/// Apply the requested sorting in insertion order.
///
/// Fields outside [`CrudResource::sortable_fields`] are dropped. When nothing survives,
/// [`CrudResource::default_sorting`] is applied instead.
pub fn apply_sorting<R: CrudResource>(
    mut select: Select<R::Entity>,
    sorting: &Sorting,
    handlers: &HandlerRegistry<R::Entity>,
) -> Select<R::Entity> {
    let alias = R::alias();
    let sortable = R::sortable_fields();
    let mut applied = 0_usize;

    for (field, order) in sorting {
        if !sortable.contains(&field.as_str()) {
            tracing::debug!(
                resource = R::ENTITY_NAME,
                field = %field,
                "Dropping sort on a field that is not sortable"
            );
            continue;
        }
        select = order_by::<R>(select, &alias, field, *order, handlers);
        applied += 1;
    }

    if applied == 0 {
        for (field, order) in R::default_sorting() {
            select = order_by::<R>(select, &alias, field, order, handlers);
        }
    }

    select
}
