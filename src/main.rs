mod cli;

use std::{fs, io::Write};

use anyhow::{bail, Context, Result};
use react_ssr::{
    config::Config,
    script::Props,
    OutputTemp, RenderOptions, Renderer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, RenderArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only rendered markup.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "react_ssr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    let mut cfg = Config::load();
    if let Some(root) = &args.root {
        cfg.set("SSR_PROJECT_ROOT", root.to_string_lossy());
    }

    match args.command {
        Command::Resolve { bundle } => {
            let renderer = Renderer::from_config(&cfg).await?;
            println!("{}", renderer.resolve(&bundle)?);
            Ok(())
        }
        Command::Render(render_args) => {
            if let Some(secs) = render_args.timeout {
                cfg.set("SSR_EXEC_TIMEOUT", secs.to_string());
            }
            if let Some(bin) = &render_args.interpreter {
                cfg.set("SSR_INTERPRETER", bin.clone());
            }
            let opts = render_options(&cfg, &render_args)?;

            let renderer = Renderer::from_config(&cfg).await?;
            let output = renderer.render(&render_args.bundle, &opts).await?;

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn render_options(cfg: &Config, args: &RenderArgs) -> Result<RenderOptions> {
    let mut opts = RenderOptions::from_config(cfg);

    let props_text = match (&args.props, &args.props_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading props file: {}", path.display()))?,
        ),
        (None, None) => None,
    };
    if let Some(text) = props_text {
        let value: serde_json::Value = serde_json::from_str(&text).context("parsing props")?;
        opts.props = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => Props::new(),
            _ => bail!("props must be a JSON object"),
        };
    }

    opts.output_temp = match &args.output_temp {
        None => OutputTemp::Disabled,
        Some(None) => OutputTemp::Default,
        Some(Some(path)) => OutputTemp::Path(path.clone()),
    };
    if let Some(n) = args.max_tries {
        opts.max_tries = n;
    }
    if let Some(ms) = args.delay {
        opts.delay = std::time::Duration::from_millis(ms);
    }
    Ok(opts)
}
