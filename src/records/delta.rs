use {
	super::{CODE_FIELDS, Record},
	serde::{Deserialize, Serialize},
	serde_json::{Map, Value},
};

/// Fields that identify a record and never change after submission.
const IMMUTABLE_FIELDS: &[&str] = &["id", "owner_id", "problem_id", "contest", "submitted_at"];

/// An incremental change to a [`Record`] document.
///
/// `$set` overwrites top-level fields, `$push` appends a single element to an
/// array field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDelta
{
	#[serde(rename = "$set", default)]
	pub set: Map<String, Value>,

	#[serde(rename = "$push", default)]
	pub push: Map<String, Value>,
}

#[derive(Debug, Display, Error)]
pub enum ApplyDeltaError
{
	#[display("field `{field}` cannot be changed")]
	Immutable
	{
		#[error(ignore)]
		field: Box<str>,
	},

	#[display("record has no field `{field}`")]
	UnknownField
	{
		#[error(ignore)]
		field: Box<str>,
	},

	#[display("cannot push to `{field}` because it is not an array")]
	NotAnArray
	{
		#[error(ignore)]
		field: Box<str>,
	},

	#[display("delta produces an invalid record: {_0}")]
	InvalidRecord(serde_json::Error),
}

impl FieldDelta
{
	/// Adds a `$set` entry.
	pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self
	{
		self.set.insert(field.into(), value.into());
		self
	}

	/// Adds a `$push` entry.
	pub fn push(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self
	{
		self.push.insert(field.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool
	{
		self.set.is_empty() && self.push.is_empty()
	}

	/// Returns whether the delta changes `field` in any way.
	pub fn touches(&self, field: &str) -> bool
	{
		self.set.contains_key(field) || self.push.contains_key(field)
	}

	/// Applies the delta to `record` and returns the updated document.
	///
	/// `record` is left untouched if the delta is invalid.
	pub fn apply(&self, record: &Record) -> Result<Record, ApplyDeltaError>
	{
		let mut document = match serde_json::to_value(record) {
			Ok(Value::Object(document)) => document,
			Ok(_) => {
				return Err(ApplyDeltaError::InvalidRecord(serde::ser::Error::custom(
					"record is not a JSON object",
				)));
			},
			Err(error) => return Err(ApplyDeltaError::InvalidRecord(error)),
		};

		if let Some(field) = self
			.set
			.keys()
			.chain(self.push.keys())
			.find(|field| IMMUTABLE_FIELDS.contains(&field.as_str()))
		{
			return Err(ApplyDeltaError::Immutable { field: field.as_str().into() });
		}

		for (field, value) in &self.set {
			let Some(slot) = document.get_mut(field) else {
				return Err(ApplyDeltaError::UnknownField { field: field.as_str().into() });
			};

			*slot = value.clone();
		}

		for (field, value) in &self.push {
			match document.get_mut(field) {
				None => {
					return Err(ApplyDeltaError::UnknownField { field: field.as_str().into() });
				},
				Some(Value::Array(values)) => values.push(value.clone()),
				Some(_) => {
					return Err(ApplyDeltaError::NotAnArray { field: field.as_str().into() });
				},
			}
		}

		serde_json::from_value(Value::Object(document)).map_err(ApplyDeltaError::InvalidRecord)
	}

	/// Returns a copy of the delta without any of the given fields.
	pub fn without(&self, fields: &[&str]) -> Self
	{
		let keep = |(field, _): &(&String, &Value)| !fields.contains(&field.as_str());

		Self {
			set: self
				.set
				.iter()
				.filter(keep)
				.map(|(field, value)| (field.clone(), value.clone()))
				.collect(),
			push: self
				.push
				.iter()
				.filter(keep)
				.map(|(field, value)| (field.clone(), value.clone()))
				.collect(),
		}
	}

	/// Returns a copy of the delta without the code fields.
	pub fn without_code(&self) -> Self
	{
		self.without(CODE_FIELDS)
	}
}

#[cfg(test)]
mod tests
{
	use {super::*, crate::testing::fixtures};

	#[test]
	fn set_overwrites_and_push_appends() -> color_eyre::Result<()>
	{
		let record = fixtures::record(1).build();
		let delta = FieldDelta::default()
			.set("status", "JUDGING")
			.set("score", 30)
			.push("judge_texts", "case #1 passed");

		let updated = delta.apply(&record)?;

		assert_eq!(updated.status, crate::records::RecordStatus::Judging);
		assert_eq!(updated.score, 30);
		assert_eq!(&*updated.judge_texts, [Box::<str>::from("case #1 passed")]);
		assert_eq!(updated.owner_id, record.owner_id);

		Ok(())
	}

	#[test]
	fn invalid_deltas_are_rejected()
	{
		let record = fixtures::record(1).build();

		let immutable = FieldDelta::default().set("status", "AC").set("id", 2);
		let unknown = FieldDelta::default().set("colour", "red");
		let not_array = FieldDelta::default().push("score", 1);
		let bad_type = FieldDelta::default().set("score", "lots");

		assert!(matches!(immutable.apply(&record), Err(ApplyDeltaError::Immutable { .. })));
		assert!(matches!(unknown.apply(&record), Err(ApplyDeltaError::UnknownField { .. })));
		assert!(matches!(not_array.apply(&record), Err(ApplyDeltaError::NotAnArray { .. })));
		assert!(matches!(bad_type.apply(&record), Err(ApplyDeltaError::InvalidRecord(_))));
	}

	#[test]
	fn identifying_fields_cannot_be_changed()
	{
		let record = fixtures::record(1).build();

		for delta in [
			FieldDelta::default().set("owner_id", 2),
			FieldDelta::default().set("problem_id", 2),
			FieldDelta::default().set("contest", serde_json::Value::Null),
			FieldDelta::default().push("submitted_at", 0),
		] {
			assert!(
				matches!(delta.apply(&record), Err(ApplyDeltaError::Immutable { .. })),
				"{delta:?} should be rejected",
			);
		}

		let hidden = FieldDelta::default().set("hidden", true).apply(&record);
		assert!(hidden.is_ok_and(|record| record.hidden));
	}

	#[test]
	fn code_fields_can_be_stripped() -> color_eyre::Result<()>
	{
		let delta = FieldDelta::default()
			.set("code", "int main() {}")
			.set("status", "CE")
			.push("compiler_texts", "error: expected `;`");

		let stripped = delta.without_code();

		assert!(!stripped.touches("code"));
		assert!(!stripped.touches("compiler_texts"));
		assert!(stripped.touches("status"));
		assert_eq!(
			serde_json::to_value(&stripped)?,
			serde_json::json!({ "$set": { "status": "CE" }, "$push": {} }),
		);

		Ok(())
	}
}
