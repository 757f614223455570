//! MultiControl replay tool
//!
//! Feeds a recorded (or hand-written) trace of raw input values through a rig
//! of controls and logs what each control reports, tick by tick.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multicontrol::bank::MAX_BANKS;
use multicontrol::config::{ControlSpec, RigConfig};
use multicontrol::hal::{elapsed_ms, ScriptedHal, SystemClock};
use multicontrol::{ActivityCounters, Clock, Control, ControlKind, Reading};

/// MultiControl - replay raw controller input through the conditioning core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rig description (YAML)
    #[arg(short, long, default_value = "rig.yaml")]
    config: String,

    /// Trace to replay (CSV: time_ms,action,target,value)
    #[arg(short, long)]
    trace: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// What a trace row does
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    /// Digital level of a button, switch or mux button
    Level,
    /// Raw ADC value of a pot
    Analog,
    /// Raw capacitive reading of a touch pad
    Touch,
    /// Switch every control to bank `value`
    Bank,
    /// Read every control at `time_ms`
    Poll,
    /// Tell a button something happened while it was held
    HoldAction,
    /// Release the bank latch of a control
    ReleaseLatch,
    /// Re-learn a touch pad's baseline
    Calibrate,
}

#[derive(Debug, Deserialize)]
struct TraceRow {
    time_ms: u32,
    action: Action,
    target: Option<String>,
    value: Option<u32>,
}

struct RigControl {
    spec: ControlSpec,
    control: Control,
    last: Option<Reading>,
}

struct Replay {
    hal: ScriptedHal,
    counters: ActivityCounters,
    controls: Vec<RigControl>,
}

impl Replay {
    fn new(rig: &RigConfig) -> Self {
        let mut hal = ScriptedHal::new();
        let controls = rig
            .controls
            .iter()
            .map(|spec| {
                let config = spec.effective_config(&rig.defaults);
                let control = if spec.kind == ControlKind::MuxButton {
                    hal.wire_mux(spec.pin, &spec.select_pins);
                    Control::mux_button(spec.pin, spec.select_pins.clone(), spec.channel, config)
                } else {
                    Control::new(spec.pin, spec.kind, config)
                };
                control.configure_pins(&mut hal);
                debug!("Control '{}' ({}) on pin {}", spec.name, spec.kind, spec.pin);

                RigControl {
                    spec: spec.clone(),
                    control,
                    last: None,
                }
            })
            .collect();

        Self {
            hal,
            counters: ActivityCounters::new(),
            controls,
        }
    }

    fn apply(&mut self, row: TraceRow) -> Result<()> {
        match row.action {
            Action::Level | Action::Analog | Action::Touch => {
                let value = row.value.context("Missing value")?;
                let index = self.find(row.target.as_deref())?;
                let spec = &self.controls[index].spec;
                match row.action {
                    Action::Level if spec.kind == ControlKind::MuxButton => {
                        self.hal.set_mux_channel(spec.pin, spec.channel, value.min(1) as u8)
                    }
                    Action::Level => self.hal.set_digital(spec.pin, value.min(1) as u8),
                    Action::Analog => self.hal.set_analog(spec.pin, clamp_u16(value)),
                    _ => self.hal.set_touch(spec.pin, clamp_u16(value)),
                }
            }
            Action::Bank => {
                let bank = row.value.context("Missing bank number")? as usize;
                if bank >= MAX_BANKS {
                    anyhow::bail!("Bank {} out of range (max {})", bank, MAX_BANKS - 1);
                }
                info!("{:>8} ms  switching to bank {}", row.time_ms, bank);
                for entry in &mut self.controls {
                    entry.control.set_bank(bank);
                }
            }
            Action::Poll => self.poll(row.time_ms),
            Action::HoldAction => {
                let index = self.find(row.target.as_deref())?;
                self.controls[index].control.notify_hold_action();
            }
            Action::ReleaseLatch => {
                let index = self.find(row.target.as_deref())?;
                self.controls[index].control.release_latch();
            }
            Action::Calibrate => {
                let index = self.find(row.target.as_deref())?;
                let entry = &mut self.controls[index];
                entry.control.calibrate_touch(&mut self.hal, &mut self.counters);
            }
        }

        Ok(())
    }

    fn poll(&mut self, now_ms: u32) {
        for entry in &mut self.controls {
            let reading = entry.control.read(&mut self.hal, now_ms, &mut self.counters);
            if entry.last != Some(reading) {
                info!("{:>8} ms  {:<12} {}", now_ms, entry.spec.name, reading);
                entry.last = Some(reading);
            }

            if entry.control.take_held() {
                info!("{:>8} ms  {:<12} held", now_ms, entry.spec.name);
            }
            if entry.control.take_double_clicked() {
                info!("{:>8} ms  {:<12} double-click", now_ms, entry.spec.name);
            }
            if entry.control.is_held_and_actioned() {
                debug!("{:>8} ms  {:<12} hold + action", now_ms, entry.spec.name);
            }
        }
    }

    fn find(&self, target: Option<&str>) -> Result<usize> {
        let name = target.context("Missing target control")?;
        self.controls
            .iter()
            .position(|entry| entry.spec.name == name)
            .with_context(|| format!("Unknown control '{}'", name))
    }

    fn print_summary(&self) {
        println!("\n{}", "=== Final control state ===".bold().cyan());
        println!(
            "  Pressed buttons: {}  Touched pads: {}",
            self.counters.pressed_buttons().to_string().green(),
            self.counters.touched_pads().to_string().green()
        );
        for entry in &self.controls {
            let latched = if entry.control.is_latched() {
                " latched".yellow().to_string()
            } else {
                String::new()
            };
            println!(
                "  {:<12} {:<10} value {:>4}  bank {}/{}{}",
                entry.spec.name.bold(),
                entry.spec.kind.to_string(),
                entry.control.value(),
                entry.control.bank(),
                entry.control.bank_count(),
                latched
            );
        }
    }
}

fn clamp_u16(value: u32) -> u16 {
    value.min(u32::from(u16::MAX)) as u16
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting MultiControl replay...");
    info!("Rig file: {}", args.config);

    let rig = RigConfig::load(&args.config)?;
    info!("Loaded {} controls", rig.controls.len());

    let mut replay = Replay::new(&rig);
    let clock = SystemClock::new();

    let mut reader = csv::Reader::from_path(&args.trace)
        .with_context(|| format!("Failed to open trace: {}", args.trace))?;
    let mut rows = 0usize;
    for (index, row) in reader.deserialize::<TraceRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = row.with_context(|| format!("Invalid trace row at line {}", line))?;
        replay
            .apply(row)
            .with_context(|| format!("Failed to apply trace row at line {}", line))?;
        rows += 1;
    }

    info!(
        "Replayed {} trace rows in {} ms",
        rows,
        elapsed_ms(clock.now_millis(), 0)
    );
    replay.print_summary();

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
