use std::{net::IpAddr, path::Path};

pub(crate) fn args() -> Args
{
	<Args as clap::Parser>::parse()
}

#[derive(Debug, clap::Parser)]
pub(crate) enum Args
{
	/// Run the HTTP server
	#[clap(name = "serve")]
	Serve
	{
		/// Path to the configuration file
		#[arg(long = "config", default_value = "/etc/oj-api.toml")]
		config_path: Box<Path>,

		/// The IP address the server should listen on
		#[arg(long = "ip")]
		ip_addr: Option<IpAddr>,

		/// The port the server should listen on
		#[arg(long)]
		port: Option<u16>,

		/// Keep everything in memory instead of connecting to a database
		#[arg(long)]
		in_memory: bool,
	},
}
