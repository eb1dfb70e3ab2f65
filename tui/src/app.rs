use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::terminal;
use reel_core::Config;
use reel_core::input::ActiveBindings;
use reel_core::input::BindingRegistry;
use reel_core::input::conf_file::ConfFileError;
use reel_core::input::conf_file::load_conf_file;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing::warn;

use crate::cli::Cli;
use crate::key_event::key_name_from_event;
use crate::logging::init_logging;
use crate::window_input::KeyOutcome;
use crate::window_input::WindowKeyInput;

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config_overrides())?;
    let _log_guard = init_logging(&config.log_dir())?;
    info!("Using reel home {}", config.reel_home.display());

    let registry = Arc::new(BindingRegistry::with_default_precedence(
        config.registry_settings(),
    ));
    load_user_conf(&registry, &config)?;
    registry.set_saved_filters(&config.saved_filters)?;

    if cli.list {
        let mut stdout = std::io::stdout().lock();
        for line in binding_lines(&registry.current()) {
            writeln!(stdout, "{line}")?;
        }
        return Ok(());
    }

    let mut changes = registry.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(changed) => info!("Bindings v{} are now active", changed.version),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} binding change notifications");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let input = WindowKeyInput::new(Arc::clone(&registry), cli.window);
    input.focus()?;
    let loop_registry = Arc::clone(&registry);
    let result = tokio::task::spawn_blocking(move || read_keys(input, &loop_registry, &config))
        .await
        .context("key reader task failed")?;

    registry.shutdown();
    watcher.abort();
    result
}

/// Replaces the user's bindings with the contents of the conf file. A
/// missing file leaves the user section empty.
fn load_user_conf(registry: &BindingRegistry, config: &Config) -> anyhow::Result<u64> {
    let mappings = match load_conf_file(&config.conf_file, config.max_conf_file_lines) {
        Ok(mappings) => mappings,
        Err(ConfFileError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            info!(
                "{} does not exist, starting without user bindings",
                config.conf_file.display()
            );
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };
    info!(
        "Loaded {} bindings from {}",
        mappings.len(),
        config.conf_file.display()
    );
    Ok(registry.replace_user_conf(mappings)?)
}

fn read_keys(
    mut input: WindowKeyInput,
    registry: &BindingRegistry,
    config: &Config,
) -> anyhow::Result<()> {
    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let result = key_loop(&mut input, registry, config);
    let restored = terminal::disable_raw_mode().context("failed to restore the terminal");
    result.and(restored)
}

fn key_loop(
    input: &mut WindowKeyInput,
    registry: &BindingRegistry,
    config: &Config,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    write!(
        stdout,
        "Reading keys for window {:?}. Ctrl+C quits, Ctrl+R reloads {}.\r\n",
        input.window(),
        config.conf_file.display()
    )?;
    stdout.flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind == KeyEventKind::Release {
            continue;
        }
        match reserved_action(&key_event) {
            Some(ReservedAction::Quit) => return Ok(()),
            Some(ReservedAction::Reload) => {
                input.key_was_handled();
                let line = match load_user_conf(registry, config) {
                    Ok(version) => format!("reloaded bindings (v{version})"),
                    Err(err) => {
                        warn!("Reload failed: {err:#}");
                        format!("reload failed: {err:#}")
                    }
                };
                write!(stdout, "{line}\r\n")?;
            }
            None => {
                let outcome = input.handle_key_event(&key_event);
                let key_name = key_name_from_event(&key_event)
                    .unwrap_or_else(|| format!("{:?}", key_event.code));
                write!(
                    stdout,
                    "{}\r\n",
                    describe_outcome(&key_name, &outcome, &input.pending_keys())
                )?;
            }
        }
        stdout.flush()?;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservedAction {
    Quit,
    Reload,
}

fn reserved_action(event: &KeyEvent) -> Option<ReservedAction> {
    if event.kind != KeyEventKind::Press || !event.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match event.code {
        KeyCode::Char('c') => Some(ReservedAction::Quit),
        KeyCode::Char('r') => Some(ReservedAction::Reload),
        _ => None,
    }
}

fn describe_outcome(key_name: &str, outcome: &KeyOutcome, pending: &[&str]) -> String {
    match outcome {
        KeyOutcome::Unbound => format!("{key_name:<12} unbound"),
        KeyOutcome::Ignored => format!("{key_name:<12} ... [{}]", pending.join(", ")),
        KeyOutcome::Command(mapping) => {
            format!("{:<12} => {}", mapping.raw_key(), mapping.readable_command())
        }
    }
}

/// One line per candidate binding, in precedence order.
fn binding_lines(bindings: &ActiveBindings) -> Vec<String> {
    bindings
        .candidates()
        .iter()
        .map(|binding| {
            let status = if binding.is_enabled() { "on " } else { "off" };
            let mut line = format!(
                "{status} <{}> {} {}",
                binding.source_section(),
                binding.mapping().raw_key(),
                binding.mapping().readable_command()
            );
            if let Some(message) = binding.display_message() {
                line.push_str(&format!("  ({message})"));
            }
            line
        })
        .collect()
}
