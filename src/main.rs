use anyhow::Result;
use bevy::prelude::*;
use clap::Parser;

use sphere_drop::{GameConfig, GamePlugin, PresentationPlugin};

#[derive(Parser, Debug)]
#[command(name = "sphere_drop", about = "Merge-puzzle simulation core")]
struct Cli {
    /// Path to the RON game configuration.
    #[arg(long, default_value = "assets/config/game.ron")]
    config: String,
    /// Run the simulation core without a window (soak testing).
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (cfg, load_err) = GameConfig::load_or_default(&cli.config);
    let mut app = App::new();
    app.insert_resource(cfg.clone());

    if cli.headless {
        app.add_plugins((MinimalPlugins, bevy::log::LogPlugin::default()));
    } else {
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: cfg.window.title.clone(),
                resolution: (cfg.window.width, cfg.window.height).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }));
    }

    if let Some(err) = load_err {
        warn!("config {}: {err}; using defaults", cli.config);
    }
    for warning in cfg.validate() {
        warn!("config: {warning}");
    }

    app.add_plugins(GamePlugin);
    if !cli.headless {
        app.add_plugins(PresentationPlugin);
    }
    app.run();
    Ok(())
}
