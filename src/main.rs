use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use precision_gamepad::controller::{
    wait_for_button, GilrsController, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
use precision_gamepad::host::{RecordingGraphics, SettingsStore};
use precision_gamepad::overlay::{precision_gamepad_source, RenderingContext, SourceRegistry};
use precision_gamepad::settings::{
    self, default_settings_path, load_or_init_settings, save_settings, LayoutConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Debug, Parser)]
#[command(about = "Throttle, brake and steering overlay")]
struct CliArgs {
    /// Settings file, defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum CliCommands {
    #[clap(about = "Sample the controller and render frames until Ctrl-C")]
    Run,
    #[clap(about = "Bind the next pressed button to throttle")]
    BindThrottle,
    #[clap(about = "Bind the next pressed button to brake")]
    BindBrake,
}

impl CliCommands {
    fn bound_key(self) -> Option<&'static str> {
        match self {
            CliCommands::Run => None,
            CliCommands::BindThrottle => Some(settings::THROTTLE_BUTTON),
            CliCommands::BindBrake => Some(settings::BRAKE_BUTTON),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let args = CliArgs::parse();
    let path = args.config.unwrap_or_else(default_settings_path);
    let command = args.command.unwrap_or(CliCommands::Run);

    let mut store = load_or_init_settings(&path).await?;

    match command.bound_key() {
        Some(key) => {
            bind_button(&mut store, key).await?;
            save_settings(&path, &store).await?;
            Ok(())
        }
        None => run_overlay(&store).await,
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn bind_button(store: &mut dyn SettingsStore, key: &'static str) -> Result<()> {
    let player_id = LayoutConfig::from_store(store).player_id;
    info!("Press the button for {} on controller {}", key, player_id);

    let mask = tokio::task::spawn_blocking(move || -> Result<Option<u16>> {
        let mut controller = GilrsController::create()
            .map_err(|e| eyre!("Failed to open controllers: {}", e))?
            .initialize();
        Ok(wait_for_button(
            &mut controller,
            player_id,
            DEFAULT_WAIT_TIMEOUT,
            DEFAULT_POLL_INTERVAL,
        ))
    })
    .await
    .map_err(|e| eyre!("Button wait task failed: {}", e))??;

    match mask {
        Some(mask) => {
            store.set_int(key, mask as i64);
            info!("Bound {} to button mask {:#06x}", key, mask);
            Ok(())
        }
        None => Err(eyre!("No button pressed, {} unchanged", key)),
    }
}

async fn run_overlay(store: &dyn SettingsStore) -> Result<()> {
    let mut registry = SourceRegistry::<RecordingGraphics>::new();
    let handle = registry
        .register(precision_gamepad_source())
        .map_err(|e| eyre!("Failed to register overlay source: {}", e))?;
    let source = registry
        .get(handle)
        .ok_or_else(|| eyre!("Registered source vanished"))?;
    info!("Running {} headless, Ctrl-C to stop", source.display_name);

    let controller = GilrsController::create()
        .map_err(|e| eyre!("Failed to open controllers: {}", e))?
        .initialize();
    let mut graphics = RecordingGraphics::new();
    let mut overlay = RenderingContext::create(store, controller, &mut graphics);

    let mut frames = 0u64;
    let mut last_log_time = Local::now();
    let log_interval = chrono::Duration::seconds(10);
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                overlay.tick(FRAME_INTERVAL.as_secs_f32());
                overlay.render(&mut graphics);
                let draws = graphics.take_commands().len();
                debug!("Frame {} submitted {} graphics commands", frames, draws);
                frames += 1;

                let now = Local::now();
                if now - last_log_time > log_interval {
                    let snapshot = overlay.snapshot();
                    if overlay.is_controller_connected() {
                        info!(
                            "Overlay stats: {} frames in last {} seconds, throttle={} brake={} steer={}",
                            frames,
                            log_interval.num_seconds(),
                            snapshot.throttle_pressed,
                            snapshot.brake_pressed,
                            snapshot.steer_axis
                        );
                    } else {
                        warn!("Overlay stats: {} frames, no controller", frames);
                    }
                    frames = 0;
                    last_log_time = now;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down overlay");
                break;
            }
        }
    }

    overlay.destroy(&mut graphics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_runs_the_overlay() {
        let args = CliArgs::try_parse_from(["precision-gamepad"]).unwrap();
        assert!(args.config.is_none());
        assert_eq!(args.command, None);
    }

    #[test]
    fn bind_commands_target_their_setting() {
        let args =
            CliArgs::try_parse_from(["precision-gamepad", "--config", "pad.toml", "bind-brake"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("pad.toml")));
        assert_eq!(args.command, Some(CliCommands::BindBrake));
        assert_eq!(CliCommands::BindBrake.bound_key(), Some(settings::BRAKE_BUTTON));
        assert_eq!(CliCommands::BindThrottle.bound_key(), Some(settings::THROTTLE_BUTTON));
        assert_eq!(CliCommands::Run.bound_key(), None);
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(CliArgs::try_parse_from(["precision-gamepad", "bind-clutch"]).is_err());
    }
}
