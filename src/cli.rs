use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "react-ssr", about = "Render a webpack server bundle with an external interpreter", version)]
pub struct Cli {
    /// Project root (overrides SSR_PROJECT_ROOT).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a bundle and print its output.
    Render(RenderArgs),
    /// Print where a bundle would be read from.
    Resolve {
        /// Logical bundle name as listed in manifest.json.
        #[arg(value_name = "BUNDLE")]
        bundle: String,
    },
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("props_source").args(["props", "props_file"]).multiple(false)))]
pub struct RenderArgs {
    /// Logical bundle name as listed in manifest.json.
    #[arg(value_name = "BUNDLE")]
    pub bundle: String,

    /// Props as a JSON object.
    #[arg(long)]
    pub props: Option<String>,

    /// Read props from a JSON file.
    #[arg(long = "props-file")]
    pub props_file: Option<PathBuf>,

    /// Keep a copy of the assembled script. Without a value it goes to
    /// `<output dir>/<bundle>`.
    #[arg(long = "output-temp", num_args = 0..=1, value_name = "PATH")]
    pub output_temp: Option<Option<PathBuf>>,

    /// Attempts when fetching from the dev server.
    #[arg(long = "max-tries")]
    pub max_tries: Option<u32>,

    /// Delay in milliseconds between fetch attempts.
    #[arg(long)]
    pub delay: Option<u64>,

    /// Interpreter timeout in seconds (0 disables).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Interpreter binary.
    #[arg(long)]
    pub interpreter: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_temp_with_and_without_value() {
        let cli = Cli::try_parse_from(["react-ssr", "render", "application.js", "--output-temp"]).unwrap();
        let Command::Render(args) = cli.command else { panic!("expected render") };
        assert_eq!(args.output_temp, Some(None));

        let cli = Cli::try_parse_from(["react-ssr", "render", "application.js", "--output-temp", "out.js"]).unwrap();
        let Command::Render(args) = cli.command else { panic!("expected render") };
        assert_eq!(args.output_temp, Some(Some(PathBuf::from("out.js"))));
    }

    #[test]
    fn props_sources_are_exclusive() {
        let res = Cli::try_parse_from([
            "react-ssr", "render", "a.js", "--props", "{}", "--props-file", "p.json",
        ]);
        assert!(res.is_err());
    }
}
