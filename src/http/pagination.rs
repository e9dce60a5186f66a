use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct PaginationResponse<T>
{
	total: u64,

	#[debug("{}", values.len())]
	values: Vec<T>,
}

impl<T> PaginationResponse<T>
{
	pub(crate) fn new(total: u64) -> Self
	{
		Self { total, values: Vec::default() }
	}
}

impl<T> Extend<T> for PaginationResponse<T>
{
	fn extend<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = T>,
	{
		self.values.extend(iter);
	}
}

/// A 1-based page number.
///
/// Missing values and `0` both mean the first page.
#[derive(Debug, Clone, Copy)]
#[debug("Page({value})")]
pub(crate) struct Page
{
	value: u32,
}

impl Page
{
	pub(crate) fn value(self) -> u32
	{
		self.value
	}
}

impl Default for Page
{
	fn default() -> Self
	{
		Self { value: 1 }
	}
}

impl<'de> Deserialize<'de> for Page
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<u32>::deserialize(deserializer)
			.map(|value| value.unwrap_or_default().max(1))
			.map(|value| Self { value })
	}
}
