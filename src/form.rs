use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::validation::{Validatable, ValidationError, ValidationErrors};

/// Form descriptor of a resource: deserialized from request values, validated, then
/// copied onto an active model.
///
/// Request values are strings when they come from an HTML form, so numeric fields
/// usually go through `serde_with`:
///
/// ```rust,ignore
/// #[serde_as]
/// #[derive(Default, Serialize, Deserialize)]
/// #[serde(default)]
/// pub struct ArticleForm {
///     pub title: String,
///     #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
///     pub views: i32,
/// }
///
/// impl EntityForm<article::ActiveModel> for ArticleForm {
///     fn bind(self, mut active: article::ActiveModel) -> article::ActiveModel {
///         active.title = Set(self.title);
///         active.views = Set(self.views);
///         active
///     }
/// }
/// ```
pub trait EntityForm<A>:
    DeserializeOwned + Serialize + Default + Validatable + Send + Sync + 'static
{
    /// Copy the form fields onto `active`.
    fn bind(self, active: A) -> A;
}

/// Deserialize a form from request values.
///
/// # Errors
///
/// A single `form` error carrying the deserializer message when the values do not fit
/// the form type.
pub fn bind_form<F: DeserializeOwned>(values: &IndexMap<String, Value>) -> Result<F, ValidationErrors> {
    let object: Map<String, Value> = values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    serde_json::from_value(Value::Object(object))
        .map_err(|err| ValidationErrors::from(ValidationError::new("form", err.to_string())))
}

/// Deserialize and validate a form.
///
/// # Errors
///
/// Every binding or validation error.
pub fn submit_form<F>(values: &IndexMap<String, Value>) -> Result<F, ValidationErrors>
where
    F: DeserializeOwned + Validatable,
{
    let form: F = bind_form(values)?;
    form.validate()?;
    Ok(form)
}
