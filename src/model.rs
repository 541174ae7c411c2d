//! Models and collections of models.
//!
//! A [`Model`] is any serde type. The trait adds the data-bag helpers that
//! handlers reach for when turning request bodies and database rows into
//! typed values: build from JSON, overlay a partial update, pick a subset
//! of fields, check required fields.
//!
//! [`Collection`] keeps an ordered list of models and knows how to build it
//! from a JSON array.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::validation::{Validator, short_type_name};

/// A typed record.
///
/// ```rust
/// use lamina::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User { id: String, name: String }
///
/// impl Model for User {}
///
/// let user = User::from_data(serde_json::json!({ "id": "u1", "name": "Ann" })).unwrap();
/// assert_eq!(User::model_name(), "User");
/// assert!(user.require(&["id", "name"], true).is_ok());
/// ```
pub trait Model: Serialize + DeserializeOwned {
    /// Name used as the subject of error messages. Defaults to the type name.
    fn model_name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }

    /// Builds a model from a JSON data bag.
    fn from_data(data: Value) -> Result<Self, Error>
    where
        Self: Sized,
    {
        serde_json::from_value(data)
            .map_err(|e| Error::validation(format!("{} data is invalid: {e}.", Self::model_name())))
    }

    /// The model's fields as a JSON object.
    fn to_fields(&self) -> Result<Map<String, Value>, Error>
    where
        Self: Sized,
    {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(Error::internal(format!("{} does not serialize to an object", Self::model_name()))),
        }
    }

    /// Copies every entry of `data` onto the model. Keys the model does not
    /// know are ignored unless the type keeps them (a `flatten`ed map).
    fn assign(&mut self, data: &Map<String, Value>) -> Result<(), Error>
    where
        Self: Sized,
    {
        let mut fields = self.to_fields()?;
        for (key, value) in data {
            fields.insert(key.clone(), value.clone());
        }
        *self = Self::from_data(Value::Object(fields))?;
        Ok(())
    }

    /// A new object holding only `keys`. Missing keys are skipped; `null`
    /// values are kept. With `alphabetize`, keys come out sorted.
    fn pick(&self, keys: &[&str], alphabetize: bool) -> Result<Map<String, Value>, Error>
    where
        Self: Sized,
    {
        let fields = self.to_fields()?;
        let mut picked: Vec<(String, Value)> = keys
            .iter()
            .filter_map(|key| fields.get(*key).map(|v| ((*key).to_owned(), v.clone())))
            .collect();
        if alphabetize {
            picked.sort_by(|a, b| a.0.cmp(&b.0));
        }
        Ok(picked.into_iter().collect())
    }

    /// Fails on the first of `keys` that is missing, or `null` when
    /// `check_null` is set.
    fn require(&self, keys: &[&str], check_null: bool) -> Result<(), Error>
    where
        Self: Sized,
    {
        let fields = self.to_fields()?;
        for key in keys {
            let missing = match fields.get(*key) {
                None => true,
                Some(Value::Null) => check_null,
                Some(_) => false,
            };
            if missing {
                return Err(Error::validation(format!("{} {key} is required.", Self::model_name())));
            }
        }
        Ok(())
    }

    /// The `id` field, when present and not `null`.
    fn id(&self) -> Option<Value>
    where
        Self: Sized,
    {
        self.to_fields().ok()?.remove("id").filter(|v| !v.is_null())
    }

    /// A [`Validator`] whose messages name this model.
    fn validator() -> Validator<'static>
    where
        Self: Sized,
    {
        Validator::with_subject(Self::model_name())
    }
}

/// Plain JSON objects are models too.
impl Model for Value {
    fn model_name() -> &'static str { "Model" }
}

// ── Collection ────────────────────────────────────────────────────────────────

/// An ordered list of models. Serializes as the list itself.
#[derive(Clone, Debug)]
pub struct Collection<M> {
    models: Vec<M>,
}

impl<M: Model> Collection<M> {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    pub fn from_models(models: Vec<M>) -> Self {
        Self { models }
    }

    /// Replaces the contents with models built from a JSON array.
    pub fn set_models(&mut self, data: Value) -> Result<(), Error> {
        let Value::Array(items) = data else {
            return Err(Error::validation(format!("{} models must be an array.", M::model_name())));
        };
        self.models = items.into_iter().map(M::from_data).collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Appends models built from a JSON array, or from a single object.
    pub fn push_models(&mut self, data: Value) -> Result<(), Error> {
        match data {
            Value::Array(items) => {
                for item in items {
                    self.models.push(M::from_data(item)?);
                }
            }
            item => self.models.push(M::from_data(item)?),
        }
        Ok(())
    }

    pub fn push(&mut self, model: M) {
        self.models.push(model);
    }

    pub fn models(&self) -> &[M] { &self.models }
    pub fn models_mut(&mut self) -> &mut [M] { &mut self.models }
    pub fn into_models(self) -> Vec<M> { self.models }
    pub fn len(&self) -> usize { self.models.len() }
    pub fn is_empty(&self) -> bool { self.models.is_empty() }

    /// Every model's id, in order. Models without one are skipped.
    pub fn model_ids(&self) -> Vec<Value> {
        self.models.iter().filter_map(|m| m.id()).collect()
    }

    /// Like [`model_ids`](Self::model_ids), duplicates removed, first seen wins.
    pub fn unique_model_ids(&self) -> Vec<Value> {
        let mut ids = Vec::new();
        for id in self.model_ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// For each model, finds the first object whose `object_prop` equals the
    /// model's `model_prop` and hands both to `f`.
    ///
    /// ```rust
    /// # use lamina::Collection;
    /// # use serde_json::{json, Value};
    /// let mut members: Collection<Value> = Collection::new();
    /// members.set_models(json!([{ "actorId": 1 }, { "actorId": 2 }])).unwrap();
    ///
    /// let actors = [json!({ "id": 2, "name": "Jon" })];
    /// members.match_models_and_objects(&actors, "id", "actorId", |member, actor| {
    ///     member["name"] = actor["name"].clone();
    /// }).unwrap();
    ///
    /// assert_eq!(members.models()[1]["name"], "Jon");
    /// assert!(members.models()[0].get("name").is_none());
    /// ```
    pub fn match_models_and_objects<F>(
        &mut self,
        objects: &[Value],
        object_prop: &str,
        model_prop: &str,
        mut f: F,
    ) -> Result<(), Error>
    where
        F: FnMut(&mut M, &Value),
    {
        for model in &mut self.models {
            let Some(key) = model.to_fields()?.remove(model_prop) else {
                continue;
            };
            if let Some(object) = objects.iter().find(|o| o.get(object_prop) == Some(&key)) {
                f(model, object);
            }
        }
        Ok(())
    }
}

impl<M: Model> Default for Collection<M> {
    fn default() -> Self { Self::new() }
}

impl<M: Serialize> Serialize for Collection<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.models.serialize(serializer)
    }
}

/// Splits `list` into runs of `size`; the last may be shorter.
/// A `size` of zero yields nothing.
pub fn chunk<T: Clone>(list: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    list.chunks(size).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct TeamMember {
        id: u32,
        actor_id: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    impl Model for TeamMember {}

    #[test]
    fn names_come_from_the_type() {
        assert_eq!(TeamMember::model_name(), "TeamMember");
        assert_eq!(Value::model_name(), "Model");
    }

    #[test]
    fn bad_data_is_a_validation_error() {
        let err = TeamMember::from_data(json!({ "id": "nope" })).unwrap_err();
        assert!(err.to_string().starts_with("TeamMember data is invalid"));
        assert_eq!(err.status_code(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[test]
    fn assign_overlays_fields() {
        let mut m = TeamMember::from_data(json!({ "id": 1, "actorId": 7 })).unwrap();
        let patch = json!({ "name": "Dan", "unknown": true });
        m.assign(patch.as_object().unwrap()).unwrap();
        assert_eq!(m, TeamMember { id: 1, actor_id: Some(7), name: Some("Dan".into()) });
    }

    #[test]
    fn pick_keeps_nulls_and_skips_missing() {
        let m = TeamMember { id: 1, actor_id: None, name: None };
        let picked = m.pick(&["name", "id", "actorId"], false).unwrap();
        assert_eq!(Value::Object(picked), json!({ "id": 1, "actorId": null }));

        let keys: Vec<_> = m.pick(&["id", "actorId"], true).unwrap().keys().cloned().collect();
        assert_eq!(keys, ["actorId", "id"]);
    }

    #[test]
    fn require_reports_the_first_missing_key() {
        let m = TeamMember { id: 1, actor_id: None, name: None };
        assert!(m.require(&["id", "actorId"], false).is_ok());
        assert_eq!(m.require(&["id", "actorId"], true).unwrap_err().to_string(), "TeamMember actorId is required.");
        assert_eq!(m.require(&["name"], false).unwrap_err().to_string(), "TeamMember name is required.");
    }

    #[test]
    fn validator_is_bound_to_the_model() {
        let err = TeamMember::validator()
            .string(&None::<String>, &crate::validation::StringOptions::new().name("name"))
            .unwrap_err();
        assert_eq!(err.to_string(), "TeamMember name is required.");
    }

    #[test]
    fn collections_build_from_arrays() {
        let mut c: Collection<TeamMember> = Collection::new();
        c.set_models(json!([{ "id": 1, "actorId": 3 }, { "id": 2, "actorId": 3 }, { "id": 1 }])).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.model_ids(), [json!(1), json!(2), json!(1)]);
        assert_eq!(c.unique_model_ids(), [json!(1), json!(2)]);

        let err = c.set_models(json!({ "id": 1 })).unwrap_err();
        assert_eq!(err.to_string(), "TeamMember models must be an array.");

        c.push_models(json!({ "id": 9 })).unwrap();
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn ids_skip_models_without_one() {
        let mut c: Collection<Value> = Collection::new();
        c.set_models(json!([{ "id": "a" }, { "name": "x" }, { "id": null }, { "id": "b" }])).unwrap();
        assert_eq!(c.model_ids(), [json!("a"), json!("b")]);
    }

    #[test]
    fn matching_attaches_objects() {
        let mut c: Collection<TeamMember> = Collection::new();
        c.set_models(json!([{ "id": 1, "actorId": 1 }, { "id": 2, "actorId": 2 }, { "id": 3 }])).unwrap();
        let actors = [json!({ "id": 1, "name": "Dan" }), json!({ "id": 2, "name": "Jon" })];

        c.match_models_and_objects(&actors, "id", "actorId", |member, actor| {
            member.name = actor["name"].as_str().map(str::to_owned);
        })
        .unwrap();

        let names: Vec<_> = c.models().iter().map(|m| m.name.as_deref()).collect();
        assert_eq!(names, [Some("Dan"), Some("Jon"), None]);
    }

    #[test]
    fn serializes_as_a_list() {
        let c = Collection::from_models(vec![json!({ "a": 1 }), json!({ "b": 2 })]);
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"[{"a":1},{"b":2}]"#);
    }

    #[test]
    fn chunks() {
        assert_eq!(chunk(&[1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(chunk(&[1, 2, 3, 4, 5], 3), vec![vec![1, 2, 3], vec![4, 5]]);
        assert!(chunk::<u8>(&[], 3).is_empty());
    }
}
