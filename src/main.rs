use clap::Parser;
use dashboard_pdf::{Export, ExportConfig, ExportMode, JsonSnapshotSource, probe_html};

mod args;
use args::{Args, Command, ExportArgs, ProbeArgs};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let outcome = match args.command {
        Command::Export(export) => run_export(export).await,
        Command::Probe(probe) => run_probe(probe).await,
    };

    if let Err(e) = outcome {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_export(args: ExportArgs) -> dashboard_pdf::Result<()> {
    ::log::info!("Starting export of {}", args.snapshot.display());

    let mut export = Export::new(JsonSnapshotSource::new(&args.snapshot));
    if let Some(path) = &args.config {
        export = export.with_config_file(path)?;
    }
    if let Some(url) = &args.url {
        export = export.with_dashboard_url(url);
    }
    if let Some(url) = &args.organization_url {
        export = export.with_organization_url(url);
    }
    if let Some(project) = &args.project {
        export = export.with_project(project);
    }
    if let Some(dir) = args.output_dir {
        export = export.with_output_dir(dir);
    }
    if let Some(millis) = args.max_wait {
        export = export.with_max_wait(millis);
    }
    if args.no_header {
        export = export.with_header(false);
    }
    if args.no_widgets {
        export = export.with_widgets(false);
    }

    if !args.metadata_only {
        println!("Note: Visual export requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );
    }

    let start_time = std::time::Instant::now();
    let report = export
        .metadata_only(args.metadata_only)
        .require_visual(args.require_visual)
        .generate()
        .await?;

    match &report.mode {
        ExportMode::Visual {
            candidate,
            readiness,
        } => ::log::info!("Captured {} ({:?})", candidate, readiness),
        ExportMode::MetadataOnly(reason) => ::log::info!("Metadata-only export: {:?}", reason),
    }
    ::log::info!(
        "Export complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );
    println!("{}", report.path.display());
    Ok(())
}

async fn run_probe(args: ProbeArgs) -> dashboard_pdf::Result<()> {
    let config = match &args.config {
        Some(path) => ExportConfig::from_file(path)?,
        None => ExportConfig::default(),
    };

    let report = probe_html(&args.page, &config).await?;
    match (&report.candidate, &report.rect) {
        (Some(candidate), Some(rect)) => println!(
            "Found {} at ({}, {}) size {}x{}",
            candidate, rect.x, rect.y, rect.width, rect.height
        ),
        _ => println!("No dashboard element found"),
    }
    println!("Readiness: {:?}", report.readiness);
    Ok(())
}
