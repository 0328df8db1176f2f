use clap::{Parser, ValueEnum};
use kagaribi::{Layout, Pipeline, Reload, Task};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Command {
    /// Compile every asset, serve the site and rebuild on changes.
    Dev,
    /// Assemble the distribution directory from scratch.
    Build,
    /// Render templates into markup.
    Templates,
    /// Bundle vendor stylesheets.
    Libs,
    /// Compile the stylesheet.
    Styles,
    /// Bundle and minify scripts.
    Scripts,
    /// Compress images into the distribution directory.
    Images,
    /// Remove the distribution directory.
    Clean,
    /// Copy compiled assets into the distribution directory.
    Copy,
    /// Rebuild on changes without serving the site.
    Watch,
    /// Serve the source directory.
    Serve,
}

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    #[clap(value_enum, index = 1, default_value = "dev")]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let pipeline = Pipeline::new(Layout::default());
    let disabled = Reload::disabled();

    match args.command {
        Command::Dev => pipeline.develop()?,
        Command::Build => pipeline.build()?,
        Command::Templates => pipeline.run(Task::Templates, &disabled)?,
        Command::Libs => pipeline.run(Task::Libs, &disabled)?,
        Command::Styles => pipeline.run(Task::Styles, &disabled)?,
        Command::Scripts => pipeline.run(Task::Scripts, &disabled)?,
        Command::Images => pipeline.run(Task::Images, &disabled)?,
        Command::Clean => pipeline.run(Task::Clean, &disabled)?,
        Command::Copy => pipeline.run(Task::Copy, &disabled)?,
        Command::Watch => {
            let (reload, _) = pipeline.live_reload()?;
            pipeline.watch(&reload)?;
        }
        Command::Serve => {
            kagaribi::server::start(pipeline.layout().app(), None)
                .join()
                .map_err(|_| anyhow::anyhow!("HTTP server thread panicked"))??;
        }
    };

    Ok(())
}

fn init_logging() {
    let indicatif = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif.get_stderr_writer()))
        .with(indicatif)
        .init();
}
