//! HTML fragments pushed to record sessions.
//!
//! Every template receives a record that has already been redacted for the
//! viewer it is rendered for; nothing in here makes visibility decisions.

use {
	crate::{
		problems::Problem,
		records::{Record, RecordStatus},
		users::User,
	},
	minijinja::{Environment, context},
	serde::Serialize,
};

const RECORD_ROW: &str = "record_row.html";
const RECORD_STATUS: &str = "record_status.html";
const RECORD_SUMMARY: &str = "record_summary.html";

#[derive(Debug, Display, Error, From)]
#[display("failed to render template: {_0}")]
pub struct RenderError(minijinja::Error);

/// The template engine.
///
/// Templates are compiled once at startup; rendering only borrows.
#[derive(Debug)]
pub struct Renderer
{
	env: Environment<'static>,
}

/// Everything a record template needs.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a>
{
	pub record: &'a Record,
	pub owner: Option<&'a User>,
	pub problem: Option<&'a Problem>,
}

#[derive(Debug, Serialize)]
struct StatusContext
{
	text: &'static str,
	class: &'static str,
	in_progress: bool,
}

#[derive(Debug, Serialize)]
struct CaseContext<'a>
{
	text: &'static str,
	class: &'static str,
	score: u32,
	time_ms: u32,
	memory_kb: u32,
	message: &'a str,
}

impl From<RecordStatus> for StatusContext
{
	fn from(status: RecordStatus) -> Self
	{
		Self {
			text: status.text(),
			class: status.css_class(),
			in_progress: status.is_in_progress(),
		}
	}
}

impl Renderer
{
	pub fn new() -> Result<Self, RenderError>
	{
		let mut env = Environment::new();

		env.add_template(RECORD_ROW, include_str!("templates/record_row.html"))?;
		env.add_template(RECORD_STATUS, include_str!("templates/record_status.html"))?;
		env.add_template(RECORD_SUMMARY, include_str!("templates/record_summary.html"))?;

		Ok(Self { env })
	}

	/// Renders a single row of the record list.
	#[tracing::instrument(level = "trace", skip_all, fields(record.id = %view.record.id), err)]
	pub fn record_row(&self, view: RecordView<'_>) -> Result<String, RenderError>
	{
		self.render(RECORD_ROW, view)
	}

	/// Renders the status panel of the record detail page.
	#[tracing::instrument(level = "trace", skip_all, fields(record.id = %view.record.id), err)]
	pub fn record_status(&self, view: RecordView<'_>) -> Result<String, RenderError>
	{
		self.render(RECORD_STATUS, view)
	}

	/// Renders the summary panel of the record detail page.
	#[tracing::instrument(level = "trace", skip_all, fields(record.id = %view.record.id), err)]
	pub fn record_summary(&self, view: RecordView<'_>) -> Result<String, RenderError>
	{
		self.render(RECORD_SUMMARY, view)
	}

	fn render(&self, name: &str, view: RecordView<'_>) -> Result<String, RenderError>
	{
		let RecordView { record, owner, problem } = view;
		let cases = record
			.cases
			.iter()
			.map(|case| CaseContext {
				text: case.status.text(),
				class: case.status.css_class(),
				score: case.score,
				time_ms: case.time_ms,
				memory_kb: case.memory_kb,
				message: &case.message,
			})
			.collect::<Vec<_>>();

		let rendered = self.env.get_template(name)?.render(context! {
			record => record,
			owner => owner,
			problem => problem,
			status => StatusContext::from(record.status),
			cases => cases,
		})?;

		Ok(rendered)
	}
}

#[cfg(test)]
mod tests
{
	use {
		super::*,
		crate::{records::CaseResult, testing::fixtures},
	};

	#[test]
	fn rows_escape_user_input() -> color_eyre::Result<()>
	{
		let renderer = Renderer::new()?;
		let record = fixtures::record(12).status(RecordStatus::Accepted).build();
		let owner = fixtures::user(1, "<script>alert(1)</script>");
		let problem = fixtures::problem(1, false);

		let html = renderer.record_row(RecordView {
			record: &record,
			owner: Some(&owner),
			problem: Some(&problem),
		})?;

		assert!(html.contains(r#"data-rid="12""#));
		assert!(html.contains("Accepted"));
		assert!(html.contains("&lt;script&gt;"));
		assert!(!html.contains("<script>"));

		Ok(())
	}

	#[test]
	fn rows_fall_back_to_ids()
	{
		let renderer = Renderer::new().unwrap();
		let record = fixtures::record(3).owner(8).problem(5).build();
		let html = renderer
			.record_row(RecordView { record: &record, owner: None, problem: None })
			.unwrap();

		assert!(html.contains("#8"));
		assert!(html.contains("#5"));
	}

	#[test]
	fn summaries_only_show_code_that_is_present() -> color_eyre::Result<()>
	{
		let renderer = Renderer::new()?;
		let mut record = fixtures::record(1).code("int main() { return 42; }").build();
		let html =
			renderer.record_summary(RecordView { record: &record, owner: None, problem: None })?;

		assert!(html.contains("return 42;"));

		record.redact_code();
		let html =
			renderer.record_summary(RecordView { record: &record, owner: None, problem: None })?;

		assert!(!html.contains("record-code"));

		Ok(())
	}

	#[test]
	fn status_lists_every_case() -> color_eyre::Result<()>
	{
		let renderer = Renderer::new()?;
		let mut record = fixtures::record(1).status(RecordStatus::WrongAnswer).build();

		record.cases = vec![
			CaseResult {
				status: RecordStatus::Accepted,
				score: 50,
				time_ms: 3,
				memory_kb: 1024,
				message: "ok".into(),
			},
			CaseResult {
				status: RecordStatus::WrongAnswer,
				score: 0,
				time_ms: 4,
				memory_kb: 1024,
				message: "expected 3, found 4".into(),
			},
		];

		let html =
			renderer.record_status(RecordView { record: &record, owner: None, problem: None })?;

		assert!(html.contains("Wrong Answer"));
		assert!(html.contains("expected 3, found 4"));
		assert_eq!(html.matches("<td>50</td>").count(), 1);

		Ok(())
	}
}
