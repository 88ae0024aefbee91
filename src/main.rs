use std::{
    io::{stdout, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, StreamTrait};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyModifiers},
    queue, style, terminal,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

use sweep_tone::{
    audio::{devices, windows},
    config::SessionConfig,
    misc::buf_writer::BufWriter,
};

mod args;
mod modules;

use args::{Args, Command};
use modules::{listener::Listener, InitContext, Module};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = SessionConfig::load(args.config.as_deref())?;
    args.command.apply(&mut config);
    config.validate().context("Invalid session config")?;

    // Setup audio devices
    let output = devices::output_device(&args.output_device, config.sample_rate, config.channels)?;
    config.sample_rate = output.sample_rate();
    config.channels = output.channels();
    println!(
        "[*] Output hooked into `{}` ({} Hz, {} ch)",
        output.name(),
        output.sample_rate(),
        output.channels()
    );

    let (input, listener) = match args.command.detect() {
        true => {
            let window = windows::get_window(&args.window)
                .with_context(|| format!("Unknown window `{}`", args.window))?;
            let input = devices::input_device(&args.input_device)?;
            println!(
                "[*] Input  hooked into `{}` ({} Hz, {} window)",
                input.name(),
                input.sample_rate(),
                window.name()
            );
            let listener = Listener::new(input.sample_rate(), input.channels(), window);
            (Some(input), Some(listener))
        }
        false => (None, None),
    };

    let ctx = InitContext { listener, config };

    let module: Arc<dyn Module + Send + Sync> = match args.command {
        Command::Sweep(_) => modules::sweep::Sweep::new(ctx),
        Command::Tone(_) => modules::tone::Tone::new(ctx),
    };
    println!("[*] Running module `{}`", module.name());

    let output_stream = {
        let mut renderer = module.engine().renderer();
        output.device.build_output_stream(
            &output.stream_config(),
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                renderer.render(data);
            },
            move |err| error!("Output stream error: {err}"),
            None,
        )?
    };

    let input_stream = match &input {
        Some(input) => {
            let module = module.clone();
            let stream = input.device.build_input_stream(
                &input.stream_config(),
                move |data: &[f32], _info: &cpal::InputCallbackInfo| module.input(data),
                move |err| error!("Input stream error: {err}"),
                None,
            )?;
            Some(stream)
        }
        None => None,
    };

    output_stream.play()?;
    if let Some(stream) = &input_stream {
        stream.play()?;
    }

    module.init()?;
    println!("[*] Press Enter, Esc or q to stop");
    let result = wait(module.as_ref());

    module.cleanup();
    println!();
    println!("[*] Stopped");
    result
}

/// Blocks until a key is pressed or the engine stops on its own,
/// printing the detection status line if there is one.
fn wait(module: &dyn Module) -> Result<()> {
    terminal::enable_raw_mode()?;
    let result = (|| -> Result<()> {
        while module.engine().is_running() {
            if let Some(listener) = module.listener() {
                let played = module.engine().current_frequency();
                let (detected, status) = listener.status(played);

                let mut stdout = BufWriter::new(stdout());
                queue!(
                    stdout,
                    cursor::MoveToColumn(0),
                    terminal::Clear(terminal::ClearType::CurrentLine),
                    style::Print(format!(
                        "Played: {played:.2} Hz, Detected: {detected:.2} Hz, Status: {status}"
                    )),
                )?;
                stdout.flush()?;
            }

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }

            if let Event::Key(e) = event::read()? {
                let ctrl_c = e.code == KeyCode::Char('c') && e.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || matches!(e.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                    break;
                }
            }
        }

        Ok(())
    })();

    terminal::disable_raw_mode()?;
    result
}
