use tracing_subscriber::EnvFilter;

const CRATES: [&str; 4] = ["wsauth", "wsauth_runtime", "wsauth_protocol", "wsauth_cli"];

/// Installs the global subscriber on stderr.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` raises our crates from
/// `warn` through `info`, `debug` and `trace`.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn default_directives(verbose: u8) -> String {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let mut directives = String::from("warn");
	for krate in CRATES {
		directives.push_str(&format!(",{krate}={level}"));
	}
	directives
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quiet_by_default() {
		assert_eq!(
			default_directives(0),
			"warn,wsauth=warn,wsauth_runtime=warn,wsauth_protocol=warn,wsauth_cli=warn"
		);
	}

	#[test]
	fn verbosity_only_raises_own_crates() {
		let directives = default_directives(2);
		assert!(directives.starts_with("warn,"));
		assert!(directives.contains("wsauth_runtime=debug"));
		assert!(default_directives(9).contains("wsauth=trace"));
	}

	#[test]
	fn directives_parse() {
		for verbose in 0..4 {
			EnvFilter::try_new(default_directives(verbose)).unwrap();
		}
	}
}
