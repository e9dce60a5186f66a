#![allow(
	missing_copy_implementations,
	reason = "configs won't be copied around"
)]

mod database;
mod http;
mod runtime;
mod tracing;

use {
	color_eyre::{
		Section,
		eyre::{self, WrapErr},
	},
	oj_api::{events::EventsConfig, sessions::SessionsConfig},
	serde::Deserialize,
	std::{fs, path::Path},
};

pub(crate) use self::{
	database::DatabaseConfig,
	http::HttpConfig,
	runtime::RuntimeConfig,
	tracing::TracingConfig,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct Config
{
	pub runtime: RuntimeConfig,
	pub tracing: TracingConfig,
	pub database: DatabaseConfig,
	pub http: HttpConfig,
	pub events: EventsConfig,
	pub sessions: SessionsConfig,
}

impl Config
{
	pub(crate) fn load_from_file(path: impl AsRef<Path>) -> eyre::Result<Self>
	{
		let file = fs::read_to_string(path.as_ref())
			.wrap_err_with(|| format!("failed to read configuration file at {:?}", path.as_ref()))
			.suggestion("create the file or run with `--config` to specify an alternative path")?;

		toml::from_str(&file).wrap_err("failed to parse configuration file")
	}
}
