use serde::{Deserialize, Serialize};

/// The judging state of a record or of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus
{
	#[serde(rename = "WAIT")]
	Waiting,

	#[serde(rename = "AC")]
	Accepted,

	#[serde(rename = "WA")]
	WrongAnswer,

	#[serde(rename = "TLE")]
	TimeLimitExceeded,

	#[serde(rename = "MLE")]
	MemoryLimitExceeded,

	#[serde(rename = "OLE")]
	OutputLimitExceeded,

	#[serde(rename = "RE")]
	RuntimeError,

	#[serde(rename = "CE")]
	CompileError,

	#[serde(rename = "SE")]
	SystemError,

	#[serde(rename = "CANCELED")]
	Canceled,

	#[serde(rename = "ETC")]
	Etc,

	#[serde(rename = "JUDGING")]
	Judging,

	#[serde(rename = "COMPILING")]
	Compiling,

	#[serde(rename = "FETCHED")]
	Fetched,

	#[serde(rename = "IGNORED")]
	Ignored,
}

impl RecordStatus
{
	/// Human readable name.
	pub const fn text(&self) -> &'static str
	{
		match *self {
			RecordStatus::Waiting => "Waiting",
			RecordStatus::Accepted => "Accepted",
			RecordStatus::WrongAnswer => "Wrong Answer",
			RecordStatus::TimeLimitExceeded => "Time Exceeded",
			RecordStatus::MemoryLimitExceeded => "Memory Exceeded",
			RecordStatus::OutputLimitExceeded => "Output Exceeded",
			RecordStatus::RuntimeError => "Runtime Error",
			RecordStatus::CompileError => "Compile Error",
			RecordStatus::SystemError => "System Error",
			RecordStatus::Canceled => "Canceled",
			RecordStatus::Etc => "Unknown Error",
			RecordStatus::Judging => "Running",
			RecordStatus::Compiling => "Compiling",
			RecordStatus::Fetched => "Fetched",
			RecordStatus::Ignored => "Ignored",
		}
	}

	/// CSS class used by the rendered fragments.
	pub const fn css_class(&self) -> &'static str
	{
		match *self {
			RecordStatus::Accepted => "pass",
			RecordStatus::WrongAnswer
			| RecordStatus::TimeLimitExceeded
			| RecordStatus::MemoryLimitExceeded
			| RecordStatus::OutputLimitExceeded
			| RecordStatus::RuntimeError
			| RecordStatus::CompileError => "fail",
			RecordStatus::SystemError | RecordStatus::Canceled | RecordStatus::Etc => "error",
			RecordStatus::Waiting
			| RecordStatus::Judging
			| RecordStatus::Compiling
			| RecordStatus::Fetched => "progress",
			RecordStatus::Ignored => "ignored",
		}
	}

	/// Whether the judge is still working on the record.
	pub const fn is_in_progress(&self) -> bool
	{
		matches!(
			*self,
			RecordStatus::Waiting
				| RecordStatus::Judging
				| RecordStatus::Compiling
				| RecordStatus::Fetched
		)
	}
}

impl Default for RecordStatus
{
	fn default() -> Self
	{
		Self::Waiting
	}
}
