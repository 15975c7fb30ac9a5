//! `zmd render` command implementation.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use futures::future::join_all;
use zmd_config::{CliSettings, Config};
use zmd_fetch::DefaultFetcher;
use zmd_widget::{Environment, FetchingScriptHost, Template, Widget};

use crate::error::CliError;
use crate::output::Output;

type CliEnvironment = Environment<DefaultFetcher, FetchingScriptHost<DefaultFetcher>>;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown sources: paths relative to the base directory, or URLs.
    #[arg(required = true)]
    sources: Vec<String>,

    /// Path to configuration file (default: auto-discover zmd.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stylesheet URL, repeatable (overrides config).
    #[arg(long = "css-url")]
    css_urls: Vec<String>,

    /// Render without stylesheets.
    #[arg(long, conflicts_with = "css_urls")]
    no_css: bool,

    /// Insert output into the light tree instead of a shadow root.
    #[arg(long)]
    no_shadow: bool,

    /// Directory local sources are resolved against (overrides config).
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Write `.html` files here, mirroring source directories, instead of
    /// printing to stdout.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Template fragment with `<xmp>` or `<style>` overrides for every source.
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Load renderer and highlighter scripts even though the engines are built in.
    #[arg(long)]
    preload_scripts: bool,

    /// Enable verbose output (show fetch and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// All sources render concurrently on one shared environment, so
    /// stylesheets and scripts are fetched once for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, output cannot be written, or
    /// any source fails to render.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_dir: self.base_dir.clone(),
            css_urls: self.resolve_css_urls(),
            no_shadow: self.no_shadow.then_some(true),
            preload_scripts: self.preload_scripts.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;

        let template = match &self.template {
            Some(path) => Some(Template::parse(&tokio::fs::read_to_string(path).await?)),
            None => None,
        };

        output.note(&format!(
            "Base directory: {}",
            config.fetch_resolved.base_dir.display()
        ));

        // Collisions are rejected before anything is fetched
        let targets: Vec<Option<PathBuf>> = match &self.out_dir {
            Some(out_dir) => output_paths(out_dir, &self.sources)?
                .into_iter()
                .map(Some)
                .collect(),
            None => vec![None; self.sources.len()],
        };

        let env = Arc::new(build_environment(&config));
        let widgets = self
            .sources
            .iter()
            .map(|source| {
                let widget = Widget::new(source.as_str(), Arc::clone(&env))
                    .with_attributes(config.attributes_for(source)?);
                Ok::<_, CliError>(match &template {
                    Some(template) => widget.with_template(template.clone()),
                    None => widget,
                })
            })
            .collect::<Result<Vec<_>, CliError>>()?;

        let results = join_all(widgets.iter().map(render_widget)).await;

        let mut failed = 0;
        for ((widget, result), target) in widgets.iter().zip(results).zip(targets) {
            if let Err(err) = result {
                output.failed(widget.id(), &err);
                failed += 1;
                continue;
            }
            let html = widget.to_html();
            match target {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&path, format!("{html}\n")).await?;
                    output.rendered(widget.id(), &path);
                }
                None => writeln!(std::io::stdout().lock(), "{html}")?,
            }
        }

        if failed > 0 {
            return Err(CliError::Failed {
                failed,
                total: widgets.len(),
            });
        }
        Ok(())
    }

    /// Resolve stylesheet URLs from --css-url/--no-css flags.
    fn resolve_css_urls(&self) -> Option<Vec<String>> {
        if self.no_css {
            Some(Vec::new())
        } else if self.css_urls.is_empty() {
            None
        } else {
            Some(self.css_urls.clone())
        }
    }
}

/// Build the environment shared by every widget in one run.
fn build_environment(config: &Config) -> CliEnvironment {
    let fetcher = DefaultFetcher::with_timeout(Duration::from_secs(
        config.fetch_resolved.timeout_secs,
    ))
    .base_dir(&config.fetch_resolved.base_dir);
    let env = Environment::new(fetcher.clone(), FetchingScriptHost::new(fetcher));

    if config.scripts.preload {
        env.with_renderer_probe(Arc::new(|| false))
            .with_highlighter_probe(Arc::new(|| false))
    } else {
        env
    }
}

/// Attach a widget and drive its automatic render cycle.
async fn render_widget(
    widget: &Widget<DefaultFetcher, FetchingScriptHost<DefaultFetcher>>,
) -> Result<(), CliError> {
    if let Some(cycle) = widget.on_attach()? {
        cycle.await?;
    }
    Ok(())
}

/// Output file for `source` under `out_dir`.
///
/// Source directories are kept, so `a/intro.md` and `b/intro.md` land in
/// different files. URLs keep the path after the host. Root and `..`
/// components are dropped so every file stays inside `out_dir`.
fn output_path(out_dir: &Path, source: &str) -> PathBuf {
    let relative = match source.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => source,
    };
    let relative = Path::new(relative);

    let mut path = out_dir.to_path_buf();
    if let Some(parent) = relative.parent() {
        path.extend(parent.components().filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        }));
    }
    let stem = relative
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("index");
    path.join(format!("{stem}.html"))
}

/// Output files for every source, in order.
///
/// # Errors
///
/// Returns [`CliError::DuplicateOutput`] if two sources map to the same file.
fn output_paths(out_dir: &Path, sources: &[String]) -> Result<Vec<PathBuf>, CliError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    sources
        .iter()
        .map(|source| {
            let path = output_path(out_dir, source);
            if let Some(first) = seen.insert(path.clone(), source) {
                return Err(CliError::DuplicateOutput {
                    path,
                    first: first.to_owned(),
                    second: source.clone(),
                });
            }
            Ok(path)
        })
        .collect()
}
